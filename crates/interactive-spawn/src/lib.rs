//! interactive-spawn: expect-style interactive sessions over spawned processes
//!
//! This crate turns a child process into an interactive session object. A
//! [`Spawner`] drives the ordered setup sequence (configure command, acquire
//! stdin pipe, acquire stdout pipe, start) through a swappable [`SpawnFunc`]
//! capability, then hands back a [`SessionContext`] pairing an [`Expecter`]
//! bound to the process's pipes with a one-shot [`ExitHandle`] fulfilled when
//! the process exits.
//!
//! Setup is fail-fast: the first failing step's error is returned untouched
//! and no session is constructed. Process termination is monitored by a
//! background task and never races the caller's use of the session.
//!
//! Two capabilities ship with the crate: [`ExecSpawnFunc`] drives a real OS
//! process (Unix), and [`MockSpawnFunc`](mock::MockSpawnFunc) scripts every
//! step deterministically for tests.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use interactive_spawn::{ExecSpawnFunc, SessionOptions, Spawner};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let spawner = Spawner::new(ExecSpawnFunc::new());
//!     let mut context = spawner.spawn(
//!         "cat",
//!         &[],
//!         Duration::from_secs(2),
//!         SessionOptions::default(),
//!     )?;
//!
//!     context.expecter().send_line("hello").await?;
//!     context.expecter().expect("hello").await?;
//!     context.expecter().close_stdin();
//!
//!     let (_expecter, exit) = context.into_parts();
//!     exit.recv().await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod expect;
pub mod mock;
pub mod options;
pub mod session;
pub mod spawn;

pub use error::{ExpectError, Result, SpawnError, WaitError};
pub use expect::{Expecter, Match, Pattern};
pub use mock::{MockController, MockSpawnFunc, SpawnStep};
pub use options::{LineEnding, SessionOptions};
pub use session::{ExitHandle, SessionContext};
#[cfg(unix)]
pub use spawn::ExecSpawnFunc;
pub use spawn::{ProcessStdin, ProcessStdout, SpawnFunc, Spawner};
