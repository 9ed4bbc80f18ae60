//! Interactive expect engine bound to a spawned process's pipes.
//!
//! The [`Expecter`] reads the child's stdout into a bounded buffer, matches
//! patterns against it, and writes to the child's stdin. Its constructor
//! also launches the background task that waits for process exit and fulfils
//! the session's [`ExitHandle`](crate::session::ExitHandle).

mod buffer;
mod pattern;

pub use pattern::{Match, Pattern};

use std::time::{Duration, Instant};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::oneshot;
use tracing::{debug, trace};

use crate::error::{ExpectError, Result};
use crate::options::SessionOptions;
use crate::session::ExitHandle;
use crate::spawn::{ProcessStdin, ProcessStdout, SpawnFunc};
use buffer::OutputBuffer;

/// Read chunk size for draining stdout.
const READ_CHUNK: usize = 4096;

/// Reads a process's stdout, matches patterns, and writes to its stdin.
pub struct Expecter {
    stdin: Option<ProcessStdin>,
    stdout: ProcessStdout,
    buffer: OutputBuffer,
    timeout: Duration,
    options: SessionOptions,
    eof: bool,
}

impl Expecter {
    /// Bind an expecter to the pipes of a started process and hand the
    /// capability to a background task that waits for the process to exit.
    ///
    /// The returned [`ExitHandle`] is fulfilled exactly once, after the
    /// process terminates.
    pub(crate) fn start<F>(
        stdin: ProcessStdin,
        stdout: ProcessStdout,
        timeout: Duration,
        options: SessionOptions,
        mut func: F,
    ) -> (Self, ExitHandle)
    where
        F: SpawnFunc + 'static,
    {
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let result = func.wait().await;
            debug!(ok = result.is_ok(), "process wait completed");
            // The receiver may already be gone; the exit status is then
            // simply unobserved.
            let _ = tx.send(result);
        });

        let expecter = Self {
            stdin: Some(stdin),
            stdout,
            buffer: OutputBuffer::new(options.buffer_size),
            timeout,
            options,
            eof: false,
        };
        (expecter, ExitHandle::new(rx))
    }

    /// Wait until `pattern` appears in the output.
    ///
    /// Output up to and including the match is consumed from the buffer.
    /// The session timeout bounds the wait.
    ///
    /// # Errors
    ///
    /// Returns an error on timeout, EOF before a match, or read failure.
    pub async fn expect(&mut self, pattern: impl Into<Pattern>) -> Result<Match> {
        let timeout = self.timeout;
        self.expect_timeout(pattern, timeout).await
    }

    /// Wait until `pattern` appears in the output, with an explicit timeout.
    ///
    /// # Errors
    ///
    /// Returns an error on timeout, EOF before a match, or read failure.
    pub async fn expect_timeout(
        &mut self,
        pattern: impl Into<Pattern>,
        timeout: Duration,
    ) -> Result<Match> {
        let pattern = pattern.into();
        let deadline = Instant::now() + timeout;

        loop {
            // Match on the raw bytes: positions from lossy-decoded text
            // would drift past invalid UTF-8 and consume the wrong range.
            if let Some(found) = pattern.find(self.buffer.as_bytes()) {
                if self.options.verbose {
                    trace!(pattern = pattern.as_str(), "pattern matched");
                }
                let data = self.buffer.as_bytes();
                let before = String::from_utf8_lossy(&data[..found.start]).into_owned();
                let matched = String::from_utf8_lossy(&data[found.start..found.end]).into_owned();
                self.buffer.consume_to(found.end);
                return Ok(Match {
                    before,
                    matched,
                    captures: found.captures,
                });
            }

            if self.eof {
                return Err(ExpectError::Eof {
                    pattern: pattern.as_str().to_string(),
                    buffer: self.buffer.as_str_lossy(),
                });
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(ExpectError::Timeout {
                    duration: timeout,
                    pattern: pattern.as_str().to_string(),
                    buffer: self.buffer.as_str_lossy(),
                });
            }

            self.read_chunk(deadline - now).await?;
        }
    }

    /// Read one chunk from stdout, giving up after `timeout`.
    ///
    /// A timeout here is not an error; the caller re-checks its deadline.
    async fn read_chunk(&mut self, timeout: Duration) -> Result<usize> {
        let mut buf = [0u8; READ_CHUNK];
        match tokio::time::timeout(timeout, self.stdout.read(&mut buf)).await {
            Ok(Ok(0)) => {
                self.eof = true;
                trace!("stdout reached EOF");
                Ok(0)
            }
            Ok(Ok(n)) => {
                if self.options.verbose {
                    trace!(bytes = n, "read from stdout");
                }
                self.buffer.append(&buf[..n]);
                Ok(n)
            }
            Ok(Err(e)) => Err(ExpectError::io_context("reading from process", e)),
            Err(_) => Ok(0),
        }
    }

    /// Send bytes to the process's stdin.
    ///
    /// # Errors
    ///
    /// Returns an error if stdin has been closed or the write fails.
    pub async fn send(&mut self, data: &[u8]) -> Result<()> {
        let stdin = self.stdin.as_mut().ok_or(ExpectError::StdinClosed)?;
        stdin
            .write_all(data)
            .await
            .map_err(|e| ExpectError::io_context("writing to process", e))?;
        stdin
            .flush()
            .await
            .map_err(|e| ExpectError::io_context("flushing process input", e))?;
        if self.options.verbose {
            trace!(bytes = data.len(), "wrote to stdin");
        }
        Ok(())
    }

    /// Send a line to the process (line ending from the session options).
    ///
    /// # Errors
    ///
    /// Returns an error if stdin has been closed or the write fails.
    pub async fn send_line(&mut self, line: &str) -> Result<()> {
        let data = format!("{line}{}", self.options.line_ending.as_str());
        self.send(data.as_bytes()).await
    }

    /// Close the child's stdin, signalling EOF to the process.
    ///
    /// Subsequent sends fail with [`ExpectError::StdinClosed`].
    pub fn close_stdin(&mut self) {
        self.stdin = None;
    }

    /// Get the current buffer contents.
    #[must_use]
    pub fn buffer(&self) -> String {
        self.buffer.as_str_lossy()
    }

    /// Clear the output buffer.
    pub fn clear_buffer(&mut self) {
        self.buffer.clear();
    }

    /// Check if the process's stdout has reached EOF.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        self.eof
    }

    /// Get the session timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl std::fmt::Debug for Expecter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Expecter")
            .field("timeout", &self.timeout)
            .field("eof", &self.eof)
            .field("buffered", &self.buffer.len())
            .field("stdin_open", &self.stdin.is_some())
            .finish_non_exhaustive()
    }
}
