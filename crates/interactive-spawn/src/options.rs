//! Configuration options for interactive sessions.

/// Default cap on buffered output retained for matching.
pub const DEFAULT_BUFFER_SIZE: usize = 1024 * 1024;

/// Line ending appended by `send_line`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    /// Unix style (`\n`).
    #[default]
    Lf,
    /// Windows style (`\r\n`).
    CrLf,
}

impl LineEnding {
    /// Get the line ending as a string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }
}

/// Options applied to the session built over a spawned process.
///
/// These bound how the expecter behaves; they do not affect the spawn
/// sequence itself.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Log every read and write at trace level.
    pub verbose: bool,
    /// Maximum number of output bytes retained for matching; oldest bytes
    /// are discarded past the cap.
    pub buffer_size: usize,
    /// Line ending appended by `send_line`.
    pub line_ending: LineEnding,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            verbose: false,
            buffer_size: DEFAULT_BUFFER_SIZE,
            line_ending: LineEnding::default(),
        }
    }
}

impl SessionOptions {
    /// Create options with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable per-read/per-write trace logging.
    #[must_use]
    pub const fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set the output buffer cap.
    #[must_use]
    pub const fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Set the line ending used by `send_line`.
    #[must_use]
    pub const fn line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }
}
