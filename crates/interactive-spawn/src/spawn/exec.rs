//! OS-backed spawn capability using `tokio::process` and `pipe(2)`.

use std::io;
use std::process::Stdio;

use futures::FutureExt;
use futures::future::BoxFuture;
use rustix::fs::{OFlags, fcntl_setfl};
use rustix::pipe::{PipeFlags, pipe_with};
use tokio::net::unix::pipe;
use tokio::process::{Child, Command};
use tracing::trace;

use super::{ProcessStdin, ProcessStdout, SpawnFunc};
use crate::error::{SpawnError, WaitError};

/// [`SpawnFunc`] backed by a real child process.
///
/// Pipe pairs are created eagerly with `pipe2(2)` so they exist before the
/// process starts: the child-side ends are handed to the command as its
/// stdio and the parent-side ends are registered with the Tokio reactor.
/// Both ends are opened close-on-exec; the ends given to the child are
/// re-duplicated onto its stdio by the spawn machinery.
#[derive(Debug, Default)]
pub struct ExecSpawnFunc {
    command: Option<Command>,
    child: Option<Child>,
}

impl ExecSpawnFunc {
    /// Create an unconfigured capability.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the configured program, for error reporting.
    fn program(&self) -> String {
        self.command.as_ref().map_or_else(String::new, |cmd| {
            cmd.as_std().get_program().to_string_lossy().into_owned()
        })
    }
}

impl SpawnFunc for ExecSpawnFunc {
    fn command(&mut self, command: &str, args: &[&str]) {
        let mut cmd = Command::new(command);
        cmd.args(args);
        self.command = Some(cmd);
    }

    fn stdin_pipe(&mut self) -> Result<ProcessStdin, SpawnError> {
        let cmd = self.command.as_mut().ok_or(SpawnError::NotConfigured)?;

        let (read, write) =
            pipe_with(PipeFlags::CLOEXEC).map_err(|e| SpawnError::StdinPipe(e.into()))?;
        fcntl_setfl(&write, OFlags::NONBLOCK).map_err(|e| SpawnError::StdinPipe(e.into()))?;
        cmd.stdin(Stdio::from(read));

        let sender = pipe::Sender::from_owned_fd(write).map_err(SpawnError::StdinPipe)?;
        Ok(Box::new(sender))
    }

    fn stdout_pipe(&mut self) -> Result<ProcessStdout, SpawnError> {
        let cmd = self.command.as_mut().ok_or(SpawnError::NotConfigured)?;

        let (read, write) =
            pipe_with(PipeFlags::CLOEXEC).map_err(|e| SpawnError::StdoutPipe(e.into()))?;
        fcntl_setfl(&read, OFlags::NONBLOCK).map_err(|e| SpawnError::StdoutPipe(e.into()))?;
        cmd.stdout(Stdio::from(write));

        let receiver = pipe::Receiver::from_owned_fd(read).map_err(SpawnError::StdoutPipe)?;
        Ok(Box::new(receiver))
    }

    fn start(&mut self) -> Result<(), SpawnError> {
        let command = self.program();
        let cmd = self.command.as_mut().ok_or(SpawnError::NotConfigured)?;

        match cmd.spawn() {
            Ok(child) => {
                trace!(command = %command, pid = child.id(), "child process started");
                self.child = Some(child);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(SpawnError::CommandNotFound { command })
            }
            Err(e) => Err(SpawnError::Start { command, source: e }),
        }
    }

    fn wait(&mut self) -> BoxFuture<'_, Result<(), WaitError>> {
        async move {
            let child = self.child.as_mut().ok_or(WaitError::NotStarted)?;
            let status = child.wait().await?;
            trace!(?status, "child process exited");
            if status.success() {
                Ok(())
            } else {
                Err(WaitError::Exited { status })
            }
        }
        .boxed()
    }
}
