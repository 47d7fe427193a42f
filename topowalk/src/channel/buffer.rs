//! Pattern buffer with efficient tail-search optimization.
//!
//! Only the last N bytes of the buffer are searched for prompt and pager
//! patterns, rather than the entire output. LLDP and MAC tables on a fully
//! populated switch run to thousands of lines, so this matters.

use regex::bytes::Regex;
use vte::{Parser, Perform};

/// Buffer for accumulating output and efficiently searching for patterns.
///
/// Incoming bytes are passed through a VT parser so colour codes, cursor
/// movement and carriage returns never reach the buffer.
pub struct PatternBuffer {
    /// The accumulated, cleaned output buffer.
    buffer: Vec<u8>,

    /// How many bytes from the end to search for patterns.
    search_depth: usize,

    /// VT parser state, carried across chunks so split escapes are handled.
    parser: Parser,
}

impl PatternBuffer {
    /// Create a new pattern buffer with the specified search depth.
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
            search_depth,
            parser: Parser::new(),
        }
    }

    /// Extend the buffer with new data, stripping terminal control sequences.
    pub fn extend(&mut self, data: &[u8]) {
        let mut sink = PrintableSink {
            out: &mut self.buffer,
        };
        self.parser.advance(&mut sink, data);
    }

    /// Search only the tail of the buffer for the pattern.
    ///
    /// Returns the match with byte offsets relative to the start of the
    /// search region (not the full buffer).
    pub fn search_tail(&self, pattern: &Regex) -> Option<regex::bytes::Match<'_>> {
        pattern.find(&self.buffer[self.tail_start()..])
    }

    /// Check if the tail contains a pattern match.
    pub fn tail_contains(&self, pattern: &Regex) -> bool {
        self.search_tail(pattern).is_some()
    }

    /// Remove the last match of `pattern` in the tail from the buffer.
    ///
    /// Used to cut pager prompts such as `--More--` out of command output
    /// once they have been answered. Returns whether anything was removed.
    pub fn remove_tail_match(&mut self, pattern: &Regex) -> bool {
        let offset = self.tail_start();
        let Some((start, end)) = pattern
            .find_iter(&self.buffer[offset..])
            .last()
            .map(|m| (offset + m.start(), offset + m.end()))
        else {
            return false;
        };
        self.buffer.drain(start..end);
        true
    }

    /// Take ownership of the buffer contents and reset.
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buffer)
    }

    /// Get a reference to the buffer contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Get the current buffer length.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    fn tail_start(&self) -> usize {
        self.buffer.len().saturating_sub(self.search_depth)
    }
}

impl Default for PatternBuffer {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl std::fmt::Debug for PatternBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternBuffer")
            .field("len", &self.buffer.len())
            .field("search_depth", &self.search_depth)
            .finish()
    }
}

/// VT performer that keeps printable text, newlines and tabs.
struct PrintableSink<'a> {
    out: &'a mut Vec<u8>,
}

impl Perform for PrintableSink<'_> {
    fn print(&mut self, c: char) {
        let mut utf8 = [0u8; 4];
        self.out.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
    }

    fn execute(&mut self, byte: u8) {
        // \r is dropped so (?m)$ anchors line up with \n
        if matches!(byte, b'\n' | b'\t') {
            self.out.push(byte);
        } else if byte == 0x08 {
            // Backspace: some switches echo a spinner or redraw the pager line
            self.out.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_extend() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"Hello, world!");
        assert_eq!(buffer.as_slice(), b"Hello, world!");
    }

    #[test]
    fn test_ansi_and_carriage_return_stripping() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"\x1b[32mGreen text\x1b[0m\r\nnext");
        assert_eq!(buffer.as_slice(), b"Green text\nnext");
    }

    #[test]
    fn test_escape_split_across_chunks() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"port 1/1\x1b[");
        buffer.extend(b"0m up");
        assert_eq!(buffer.as_slice(), b"port 1/1 up");
    }

    #[test]
    fn test_tail_search() {
        let mut buffer = PatternBuffer::new(20);
        buffer.extend(&[b'x'; 100]);
        buffer.extend(b"\nEthernetSwitch#");

        let pattern = Regex::new(r"EthernetSwitch#").unwrap();
        assert!(buffer.search_tail(&pattern).is_some());
    }

    #[test]
    fn test_tail_search_not_in_tail() {
        let mut buffer = PatternBuffer::new(10);
        buffer.extend(b"EthernetSwitch#");
        buffer.extend(&[b'x'; 100]);

        let pattern = Regex::new(r"EthernetSwitch#").unwrap();
        assert!(buffer.search_tail(&pattern).is_none());
    }

    #[test]
    fn test_remove_tail_match() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"line one\n--More--");

        let pager = Regex::new(r"--More--").unwrap();
        assert!(buffer.remove_tail_match(&pager));
        assert_eq!(buffer.as_slice(), b"line one\n");
        assert!(!buffer.remove_tail_match(&pager));
    }

    #[test]
    fn test_take_clears_buffer() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"test data");
        assert_eq!(buffer.take(), b"test data");
        assert!(buffer.is_empty());
    }
}
