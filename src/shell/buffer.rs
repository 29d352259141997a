//! Forensic input buffer the operator pastes text into

use log::debug;

/// Buffer that accumulates pasted lines until an audit is triggered
pub struct InputBuffer {
    buffer: String,
}

impl InputBuffer {
    /// Create a new empty buffer
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
        }
    }

    /// Append one line of input
    pub fn push_line(&mut self, line: &str) {
        self.buffer.push_str(line);
        self.buffer.push('\n');
    }

    /// Append a block of text, e.g. clipboard contents
    pub fn push_block(&mut self, text: &str) {
        self.buffer.push_str(text);
        if !text.is_empty() && !text.ends_with('\n') {
            self.buffer.push('\n');
        }
    }

    /// Get the current buffer contents
    pub fn contents(&self) -> &str {
        &self.buffer
    }

    /// Discard everything in the buffer
    pub fn clear(&mut self) {
        debug!("Clearing input buffer: {} chars", self.buffer.len());
        self.buffer.clear();
    }

    /// Number of lines currently held
    pub fn line_count(&self) -> usize {
        self.buffer.lines().count()
    }
}

impl Default for InputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_buffer() {
        let buffer = InputBuffer::new();
        assert_eq!(buffer.contents(), "");
        assert_eq!(buffer.line_count(), 0);
    }

    #[test]
    fn test_push_line() {
        let mut buffer = InputBuffer::new();
        buffer.push_line("sshd: Accepted publickey");
        buffer.push_line("");
        buffer.push_line("sudo: session opened");

        assert_eq!(buffer.contents(), "sshd: Accepted publickey\n\nsudo: session opened\n");
        assert_eq!(buffer.line_count(), 3);
    }

    #[test]
    fn test_push_block() {
        let mut buffer = InputBuffer::new();
        buffer.push_block("one\ntwo");
        buffer.push_block("three\n");
        buffer.push_block("");
        assert_eq!(buffer.contents(), "one\ntwo\nthree\n");
    }

    #[test]
    fn test_clear() {
        let mut buffer = InputBuffer::new();
        buffer.push_line("   ");
        buffer.push_line("\t");
        assert_eq!(buffer.line_count(), 2);

        buffer.clear();
        assert_eq!(buffer.contents(), "");
        assert_eq!(buffer.line_count(), 0);
    }
}
