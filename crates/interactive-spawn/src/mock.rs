//! Deterministic in-memory spawn capability for tests.
//!
//! [`MockSpawnFunc`] scripts the outcome of every spawn step and records the
//! order in which steps are invoked, so orchestration logic can be exercised
//! without creating real processes. The pipes it hands out are in-memory
//! duplex streams whose far ends live on the paired [`MockController`]:
//! write to the controller to feed the session "process output", read from
//! it to observe what the session sent to "stdin".

use std::io;
use std::sync::{Arc, Mutex, PoisonError};

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

use crate::error::{Result, SpawnError, WaitError};
use crate::spawn::{ProcessStdin, ProcessStdout, SpawnFunc};

/// Capacity of the in-memory pipes.
const PIPE_CAPACITY: usize = 64 * 1024;

/// A spawn step observed by the mock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnStep {
    /// `command` was invoked.
    Command,
    /// `stdin_pipe` was invoked.
    StdinPipe,
    /// `stdout_pipe` was invoked.
    StdoutPipe,
    /// `start` was invoked.
    Start,
    /// `wait` was invoked.
    Wait,
}

#[derive(Debug, Default)]
struct CallLog {
    steps: Vec<SpawnStep>,
    commands: Vec<(String, Vec<String>)>,
}

/// Scripted spawn capability.
///
/// Every step succeeds unless a failure is scripted with the `fail_*`
/// builders; `wait` resolves to the scripted result (clean exit by
/// default).
pub struct MockSpawnFunc {
    stdin_error: Option<SpawnError>,
    stdout_error: Option<SpawnError>,
    start_error: Option<SpawnError>,
    wait_result: Option<Result<(), WaitError>>,
    stdin: Option<DuplexStream>,
    stdout: Option<DuplexStream>,
    log: Arc<Mutex<CallLog>>,
}

impl MockSpawnFunc {
    /// Create a mock whose steps all succeed, plus the controller holding
    /// the far ends of its pipes and the call log.
    #[must_use]
    pub fn new() -> (Self, MockController) {
        let (stdin_near, stdin_far) = tokio::io::duplex(PIPE_CAPACITY);
        let (stdout_near, stdout_far) = tokio::io::duplex(PIPE_CAPACITY);
        let log = Arc::new(Mutex::new(CallLog::default()));

        let func = Self {
            stdin_error: None,
            stdout_error: None,
            start_error: None,
            wait_result: Some(Ok(())),
            stdin: Some(stdin_near),
            stdout: Some(stdout_near),
            log: Arc::clone(&log),
        };
        let controller = MockController {
            log,
            stdin_peer: Some(stdin_far),
            stdout_peer: Some(stdout_far),
        };
        (func, controller)
    }

    /// Script `stdin_pipe` to fail with `error`.
    #[must_use]
    pub fn fail_stdin(mut self, error: SpawnError) -> Self {
        self.stdin_error = Some(error);
        self
    }

    /// Script `stdout_pipe` to fail with `error`.
    #[must_use]
    pub fn fail_stdout(mut self, error: SpawnError) -> Self {
        self.stdout_error = Some(error);
        self
    }

    /// Script `start` to fail with `error`.
    #[must_use]
    pub fn fail_start(mut self, error: SpawnError) -> Self {
        self.start_error = Some(error);
        self
    }

    /// Script the result `wait` resolves to.
    #[must_use]
    pub fn wait_result(mut self, result: Result<(), WaitError>) -> Self {
        self.wait_result = Some(result);
        self
    }

    fn record(&self, step: SpawnStep) {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .steps
            .push(step);
    }
}

impl SpawnFunc for MockSpawnFunc {
    fn command(&mut self, command: &str, args: &[&str]) {
        self.record(SpawnStep::Command);
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .commands
            .push((
                command.to_string(),
                args.iter().map(ToString::to_string).collect(),
            ));
    }

    fn stdin_pipe(&mut self) -> Result<ProcessStdin, SpawnError> {
        self.record(SpawnStep::StdinPipe);
        if let Some(error) = self.stdin_error.take() {
            return Err(error);
        }
        match self.stdin.take() {
            Some(stream) => Ok(Box::new(stream)),
            None => Err(SpawnError::StdinPipe(io::Error::other(
                "stdin pipe already taken",
            ))),
        }
    }

    fn stdout_pipe(&mut self) -> Result<ProcessStdout, SpawnError> {
        self.record(SpawnStep::StdoutPipe);
        if let Some(error) = self.stdout_error.take() {
            return Err(error);
        }
        match self.stdout.take() {
            Some(stream) => Ok(Box::new(stream)),
            None => Err(SpawnError::StdoutPipe(io::Error::other(
                "stdout pipe already taken",
            ))),
        }
    }

    fn start(&mut self) -> Result<(), SpawnError> {
        self.record(SpawnStep::Start);
        match self.start_error.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn wait(&mut self) -> BoxFuture<'_, Result<(), WaitError>> {
        self.record(SpawnStep::Wait);
        // Repeated calls after the scripted result is consumed resolve to
        // StatusLost.
        let result = self
            .wait_result
            .take()
            .unwrap_or(Err(WaitError::StatusLost));
        async move { result }.boxed()
    }
}

impl std::fmt::Debug for MockSpawnFunc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSpawnFunc")
            .field("stdin_error", &self.stdin_error.is_some())
            .field("stdout_error", &self.stdout_error.is_some())
            .field("start_error", &self.start_error.is_some())
            .finish_non_exhaustive()
    }
}

/// Far ends of a [`MockSpawnFunc`]'s pipes, plus its call log.
#[derive(Debug)]
pub struct MockController {
    log: Arc<Mutex<CallLog>>,
    stdin_peer: Option<DuplexStream>,
    stdout_peer: Option<DuplexStream>,
}

impl MockController {
    /// The spawn steps invoked so far, in order.
    #[must_use]
    pub fn steps(&self) -> Vec<SpawnStep> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .steps
            .clone()
    }

    /// The commands configured so far, with their arguments.
    #[must_use]
    pub fn commands(&self) -> Vec<(String, Vec<String>)> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .commands
            .clone()
    }

    /// Feed bytes to the session as if the process wrote them to stdout.
    ///
    /// # Errors
    ///
    /// Returns an error if the session end of the pipe is gone.
    pub async fn push_output(&mut self, data: &[u8]) -> io::Result<()> {
        let peer = self
            .stdout_peer
            .as_mut()
            .ok_or_else(|| io::Error::other("stdout peer closed"))?;
        peer.write_all(data).await?;
        peer.flush().await
    }

    /// Close the process side of stdout, signalling EOF to the session.
    pub fn close_output(&mut self) {
        self.stdout_peer = None;
    }

    /// Read one chunk of what the session wrote to the process's stdin.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    pub async fn read_input(&mut self) -> io::Result<Vec<u8>> {
        let peer = self
            .stdin_peer
            .as_mut()
            .ok_or_else(|| io::Error::other("stdin peer closed"))?;
        let mut buf = [0u8; PIPE_CAPACITY / 16];
        let n = peer.read(&mut buf).await?;
        Ok(buf[..n].to_vec())
    }
}
