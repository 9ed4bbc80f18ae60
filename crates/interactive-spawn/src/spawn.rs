//! Process spawning capability and orchestration.
//!
//! The [`SpawnFunc`] trait abstracts how a child process is created and
//! supervised, so the same orchestration drives both a real OS process
//! ([`ExecSpawnFunc`]) and a deterministic in-memory double
//! ([`MockSpawnFunc`](crate::mock::MockSpawnFunc)). The [`Spawner`] runs the
//! ordered setup sequence and wraps the result into a
//! [`SessionContext`](crate::session::SessionContext).

#[cfg(unix)]
mod exec;

#[cfg(unix)]
pub use exec::ExecSpawnFunc;

use std::time::Duration;

use futures::future::BoxFuture;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use crate::error::{SpawnError, WaitError};
use crate::expect::Expecter;
use crate::options::SessionOptions;
use crate::session::SessionContext;

/// Writable stream connected to the child's standard input.
pub type ProcessStdin = Box<dyn AsyncWrite + Send + Unpin>;

/// Readable stream connected to the child's standard output.
pub type ProcessStdout = Box<dyn AsyncRead + Send + Unpin>;

/// Capability for creating and supervising a child process.
///
/// Implementations must support the fixed call order used by
/// [`Spawner::spawn`]: `command`, then `stdin_pipe`, then `stdout_pipe`,
/// then `start`, with `wait` invoked afterwards from a background task.
pub trait SpawnFunc: Send {
    /// Configure the command and arguments to run.
    ///
    /// Must be called before any other operation.
    fn command(&mut self, command: &str, args: &[&str]);

    /// Acquire a writable pipe connected to the child's stdin.
    ///
    /// # Errors
    ///
    /// Returns an error if the pipe cannot be acquired.
    fn stdin_pipe(&mut self) -> Result<ProcessStdin, SpawnError>;

    /// Acquire a readable pipe connected to the child's stdout.
    ///
    /// # Errors
    ///
    /// Returns an error if the pipe cannot be acquired.
    fn stdout_pipe(&mut self) -> Result<ProcessStdout, SpawnError>;

    /// Begin execution of the configured command.
    ///
    /// # Errors
    ///
    /// Returns an error if the executable cannot be located or launched.
    fn start(&mut self) -> Result<(), SpawnError>;

    /// Resolve when the process exits; `Ok(())` on clean exit.
    ///
    /// The production path calls this exactly once, from the background
    /// task owned by the session. Doubles tolerate repeated calls.
    fn wait(&mut self) -> BoxFuture<'_, Result<(), WaitError>>;
}

/// Orchestrates the spawn sequence and hands back a [`SessionContext`].
///
/// The capability is injected at construction time; one spawner drives
/// exactly one process attempt and is consumed by [`Spawner::spawn`].
#[derive(Debug)]
pub struct Spawner<F> {
    func: F,
}

impl<F: SpawnFunc + 'static> Spawner<F> {
    /// Create a spawner around the given capability.
    pub const fn new(func: F) -> Self {
        Self { func }
    }

    /// Spawn `command` with `args` and wire an interactive session to it.
    ///
    /// The setup steps run strictly in order and fail fast: stdin pipe,
    /// stdout pipe, start. The first failing step's error is returned
    /// untouched and no session is constructed. On success, a background
    /// task waits on the process and fulfils the context's exit handle;
    /// `timeout` bounds pattern matching in the session's expecter, not the
    /// setup steps themselves.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing setup step, verbatim.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime, which is needed for the
    /// background wait task.
    pub fn spawn(
        mut self,
        command: &str,
        args: &[&str],
        timeout: Duration,
        options: SessionOptions,
    ) -> Result<SessionContext, SpawnError> {
        self.func.command(command, args);

        let stdin = self.func.stdin_pipe()?;
        debug!(command, "acquired stdin pipe");

        // If a later step fails, the stdin handle is dropped here, which
        // closes the half-open pipe.
        let stdout = self.func.stdout_pipe()?;
        debug!(command, "acquired stdout pipe");

        self.func.start()?;
        debug!(command, ?timeout, "process started");

        let (expecter, exit) = Expecter::start(stdin, stdout, timeout, options, self.func);
        Ok(SessionContext::new(expecter, exit))
    }
}
