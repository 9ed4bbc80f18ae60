//! Error types for spawning and driving interactive sessions.
//!
//! Spawn-time failures are split per setup step so a caller can tell which
//! step of the sequence failed without parsing messages. Process exit
//! failures travel separately, through the session's exit handle.

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

/// Errors raised while setting up a child process.
///
/// The spawn sequence fails fast: the first failing step's error is returned
/// as-is and no session is constructed.
#[derive(Debug, Error)]
pub enum SpawnError {
    /// The stdin pipe could not be acquired.
    #[error("failed to acquire stdin pipe: {0}")]
    StdinPipe(#[source] io::Error),

    /// The stdout pipe could not be acquired.
    #[error("failed to acquire stdout pipe: {0}")]
    StdoutPipe(#[source] io::Error),

    /// The executable could not be located.
    #[error("command not found: {command}")]
    CommandNotFound {
        /// The command that was not found.
        command: String,
    },

    /// The executable exists but could not be launched.
    #[error("failed to start {command}: {source}")]
    Start {
        /// The command that failed to start.
        command: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A spawn step was invoked before the command was configured.
    #[error("spawn step invoked before command was configured")]
    NotConfigured,
}

/// Errors reported by the background wait on a child process.
///
/// Delivered through the session's [`ExitHandle`](crate::session::ExitHandle),
/// never as a spawn return value.
#[derive(Debug, Error)]
pub enum WaitError {
    /// The process exited with a non-zero status or was killed by a signal.
    #[error("process exited with {status}")]
    Exited {
        /// The exit status of the process.
        status: ExitStatus,
    },

    /// Waiting on the process failed at the OS level.
    #[error("failed to wait for process: {0}")]
    Io(#[from] io::Error),

    /// Wait was attempted before the process was started.
    #[error("process was never started")]
    NotStarted,

    /// The background task stopped without reporting an exit status.
    #[error("exit status was never reported")]
    StatusLost,
}

/// Errors raised while interacting with a running session.
#[derive(Debug, Error)]
pub enum ExpectError {
    /// Timeout waiting for a pattern match.
    #[error("timeout after {duration:?} waiting for pattern '{pattern}' (buffer: {buffer:?})")]
    Timeout {
        /// The timeout duration that elapsed.
        duration: Duration,
        /// The pattern that was being searched for.
        pattern: String,
        /// Buffer contents at the time of timeout.
        buffer: String,
    },

    /// The process closed its output before the pattern was found.
    #[error("end of output reached while waiting for pattern '{pattern}' (buffer: {buffer:?})")]
    Eof {
        /// The pattern that was being searched for.
        pattern: String,
        /// Buffer contents when EOF was reached.
        buffer: String,
    },

    /// An I/O error occurred with additional context.
    #[error("{context}: {source}")]
    Io {
        /// What operation was being performed.
        context: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The child's stdin has already been closed.
    #[error("stdin has been closed")]
    StdinClosed,

    /// Invalid regex pattern.
    #[error("invalid regex pattern: {0}")]
    Regex(#[from] regex::Error),
}

impl ExpectError {
    /// Create an I/O error with context.
    pub fn io_context(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Check if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Check if this is an EOF error.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self, Self::Eof { .. })
    }
}

/// Result type alias for session operations.
pub type Result<T, E = ExpectError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_error_messages_name_the_step() {
        let err = SpawnError::StdinPipe(io::Error::other("resource exhausted"));
        assert_eq!(
            err.to_string(),
            "failed to acquire stdin pipe: resource exhausted"
        );

        let err = SpawnError::CommandNotFound {
            command: "frobnicate".into(),
        };
        assert_eq!(err.to_string(), "command not found: frobnicate");
    }

    #[test]
    fn expect_error_predicates() {
        let timeout = ExpectError::Timeout {
            duration: Duration::from_secs(1),
            pattern: "$ ".into(),
            buffer: String::new(),
        };
        assert!(timeout.is_timeout());
        assert!(!timeout.is_eof());

        let eof = ExpectError::Eof {
            pattern: "$ ".into(),
            buffer: String::new(),
        };
        assert!(eof.is_eof());
    }

    #[test]
    fn io_context_preserves_source() {
        let err = ExpectError::io_context("writing to process", io::Error::other("broken pipe"));
        assert_eq!(err.to_string(), "writing to process: broken pipe");
        assert!(std::error::Error::source(&err).is_some());
    }
}
