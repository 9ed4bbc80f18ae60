//! Session handle returned from a successful spawn.

use std::time::Duration;

use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

use crate::error::{Result, WaitError};
use crate::expect::Expecter;

/// One-shot handle to a child process's exit result.
///
/// Fulfilled exactly once, by the background wait task, after the process
/// terminates. A clean exit arrives as `Ok(())`; a non-zero exit, signal,
/// or wait failure arrives as a [`WaitError`]. If the background task
/// disappears without reporting, receivers observe
/// [`WaitError::StatusLost`].
#[derive(Debug)]
pub struct ExitHandle {
    rx: oneshot::Receiver<Result<(), WaitError>>,
}

impl ExitHandle {
    pub(crate) const fn new(rx: oneshot::Receiver<Result<(), WaitError>>) -> Self {
        Self { rx }
    }

    /// Wait for the process to exit and return its result.
    ///
    /// # Errors
    ///
    /// Returns the wait failure, or [`WaitError::StatusLost`] if the
    /// background task stopped without reporting.
    pub async fn recv(self) -> Result<(), WaitError> {
        match self.rx.await {
            Ok(result) => result,
            Err(_) => Err(WaitError::StatusLost),
        }
    }

    /// Wait for the process to exit, giving up after `timeout`.
    ///
    /// Returns `None` if the process has not exited within the bound.
    pub async fn recv_timeout(self, timeout: Duration) -> Option<Result<(), WaitError>> {
        tokio::time::timeout(timeout, self.recv()).await.ok()
    }

    /// Check for an exit result without blocking.
    ///
    /// Returns `None` while the process is still running.
    pub fn try_recv(&mut self) -> Option<Result<(), WaitError>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(WaitError::StatusLost)),
        }
    }
}

/// Handle to a successfully spawned interactive session.
///
/// Pairs the [`Expecter`] bound to the process's pipes with the
/// [`ExitHandle`] for its termination. Constructed only after every spawn
/// step has succeeded; never mutated afterwards. Dropping the context
/// releases the pipes and abandons the exit status, independent of whether
/// the process has exited.
#[derive(Debug)]
pub struct SessionContext {
    expecter: Expecter,
    exit: ExitHandle,
}

impl SessionContext {
    pub(crate) const fn new(expecter: Expecter, exit: ExitHandle) -> Self {
        Self { expecter, exit }
    }

    /// The interactive expecter bound to the process's pipes.
    pub fn expecter(&mut self) -> &mut Expecter {
        &mut self.expecter
    }

    /// Check the process's exit result without blocking.
    ///
    /// Returns `None` while the process is still running.
    pub fn try_exit_status(&mut self) -> Option<Result<(), WaitError>> {
        self.exit.try_recv()
    }

    /// Split the context into its expecter and exit handle.
    #[must_use]
    pub fn into_parts(self) -> (Expecter, ExitHandle) {
        (self.expecter, self.exit)
    }
}
