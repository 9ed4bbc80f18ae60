//! Bounded buffer for accumulated process output.

use bytes::BytesMut;

/// Accumulates output bytes, discarding the oldest once the cap is reached.
#[derive(Debug)]
pub struct OutputBuffer {
    data: BytesMut,
    max_size: usize,
}

impl OutputBuffer {
    /// Create a buffer that retains at most `max_size` bytes.
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self {
            data: BytesMut::new(),
            max_size,
        }
    }

    /// Append data, dropping the oldest bytes past the cap.
    pub fn append(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
        if self.data.len() > self.max_size {
            let excess = self.data.len() - self.max_size;
            let _ = self.data.split_to(excess);
        }
    }

    /// Discard everything up to and including byte position `end`.
    pub fn consume_to(&mut self, end: usize) {
        let end = end.min(self.data.len());
        let _ = self.data.split_to(end);
    }

    /// Get the raw buffered bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Get the buffer contents as a string, replacing invalid UTF-8.
    #[must_use]
    pub fn as_str_lossy(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }

    /// Number of buffered bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.data.clear();
    }
}
