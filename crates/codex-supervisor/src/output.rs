//! Bounded capture of a single output stream
//!
//! An [`OutputBuffer`] accumulates text up to a fixed byte ceiling. The first
//! chunk that would cross the ceiling is cut at the boundary, the
//! [`TRUNCATION_MARKER`] is appended, and from then on every chunk is dropped.
//! The buffer never wraps or rotates: what was captured before the cut stays,
//! everything after it is lost.

/// Text appended once when a buffer reaches its ceiling
pub const TRUNCATION_MARKER: &str = "\n... [output truncated due to size limit] ...";

/// Default per-stream ceiling: 10 MiB
pub const DEFAULT_MAX_OUTPUT_SIZE: usize = 10 * 1024 * 1024;

/// Append-only text accumulator with a byte ceiling
#[derive(Debug, Clone)]
pub struct OutputBuffer {
    content: String,
    truncated: bool,
    max_size: usize,
}

impl OutputBuffer {
    /// Create an empty buffer holding at most `max_size` bytes of output
    pub fn new(max_size: usize) -> Self {
        Self {
            content: String::new(),
            truncated: false,
            max_size,
        }
    }

    /// Append a chunk of output
    ///
    /// Once the buffer is truncated this is a no-op.
    pub fn append(&mut self, chunk: &str) {
        if self.truncated {
            return;
        }

        if self.content.len() + chunk.len() <= self.max_size {
            self.content.push_str(chunk);
            return;
        }

        let remaining = self.max_size.saturating_sub(self.content.len());
        let cut = floor_char_boundary(chunk, remaining);
        self.content.push_str(&chunk[..cut]);
        self.content.push_str(TRUNCATION_MARKER);
        self.truncated = true;
    }

    /// Captured text so far
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Whether the ceiling was hit
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Configured ceiling in bytes
    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_OUTPUT_SIZE)
    }
}

/// Largest index `<= index` that falls on a char boundary of `s`
fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut cut = index;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    cut
}
