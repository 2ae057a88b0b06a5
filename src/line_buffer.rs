//! Line accumulation over raw byte chunks.
//!
//! Bytes arrive in arbitrary chunks; lines leave one at a time. The buffer
//! is a single `BytesMut` with two operations: append a chunk, and consume
//! the prefix up to and including the first `\n`. Extraction is repeatable
//! without further I/O while earlier large reads left more terminators in
//! the buffer, so multiple lines delivered in one chunk are served one per
//! call with no re-request.
//!
//! # Example
//!
//! ```
//! use aiswire::LineBuffer;
//!
//! let mut buffer = LineBuffer::new();
//! buffer.push(b"!AIVDM,1,1,,A,xyz\r\n!AIVDM,2");
//!
//! assert_eq!(buffer.take_line().as_deref(), Some("!AIVDM,1,1,,A,xyz"));
//! assert_eq!(buffer.take_line(), None); // "!AIVDM,2" is unterminated
//! assert_eq!(buffer.len(), 8);
//! ```

use bytes::BytesMut;

/// Initial buffer capacity; NMEA sentences are short.
const INITIAL_CAPACITY: usize = 4 * 1024;

/// Buffer of bytes received but not yet returned as a complete line.
///
/// Invariant: after each successful [`take_line`](Self::take_line), the
/// buffer holds exactly the bytes following the terminator that was found.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buffer: BytesMut,
}

impl LineBuffer {
    /// Create an empty line buffer.
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(INITIAL_CAPACITY),
        }
    }

    /// Bytes currently buffered.
    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether nothing is buffered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Append a chunk of raw bytes.
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Extract the first complete line, if a terminator is present.
    ///
    /// Consumes the bytes through the first `\n` inclusive, strips the
    /// trailing `\r`/`\n`, and decodes the rest as text. Returns `None`
    /// when no terminator is buffered yet.
    pub fn take_line(&mut self) -> Option<String> {
        let newline = self.buffer.iter().position(|&b| b == b'\n')?;
        let line = self.buffer.split_to(newline + 1);
        Some(decode_trimmed(&line))
    }

    /// Drain everything left as a final, unterminated line.
    ///
    /// Used when the stream terminates with bytes still buffered; returns
    /// `None` if the buffer is already empty.
    pub fn flush_remainder(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let rest = self.buffer.split_to(self.buffer.len());
        Some(decode_trimmed(&rest))
    }
}

/// Strip trailing `\r`/`\n` bytes and decode as ASCII-compatible text.
///
/// NMEA payloads are ASCII; lossy UTF-8 keeps a corrupt byte from killing
/// the whole stream.
fn decode_trimmed(bytes: &[u8]) -> String {
    let mut end = bytes.len();
    while end > 0 && (bytes[end - 1] == b'\n' || bytes[end - 1] == b'\r') {
        end -= 1;
    }
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_terminator_yields_nothing() {
        let mut buffer = LineBuffer::new();
        buffer.push(b"!AIVDM,1,1,,A");
        assert_eq!(buffer.take_line(), None);
        assert_eq!(buffer.len(), 13);
    }

    #[test]
    fn test_crlf_is_stripped() {
        let mut buffer = LineBuffer::new();
        buffer.push(b"!AIVDM,1,1,,A,xyz\r\n");
        assert_eq!(buffer.take_line().as_deref(), Some("!AIVDM,1,1,,A,xyz"));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_two_terminators_in_one_chunk_yield_two_lines() {
        let mut buffer = LineBuffer::new();
        buffer.push(b"first\nsecond\nrest");

        assert_eq!(buffer.take_line().as_deref(), Some("first"));
        assert_eq!(buffer.take_line().as_deref(), Some("second"));
        assert_eq!(buffer.take_line(), None);
        assert_eq!(buffer.len(), 4);
    }

    #[test]
    fn test_terminator_on_chunk_boundary() {
        let mut buffer = LineBuffer::new();
        buffer.push(b"boundary\n");
        buffer.push(b"next");

        assert_eq!(buffer.take_line().as_deref(), Some("boundary"));
        assert_eq!(buffer.take_line(), None);
        assert_eq!(buffer.len(), 4);
    }

    #[test]
    fn test_line_split_across_chunks() {
        let mut buffer = LineBuffer::new();
        buffer.push(b"!AIVDM,1,");
        assert_eq!(buffer.take_line(), None);
        buffer.push(b"1,,A,xyz\n");
        assert_eq!(buffer.take_line().as_deref(), Some("!AIVDM,1,1,,A,xyz"));
    }

    #[test]
    fn test_empty_line_is_a_line() {
        let mut buffer = LineBuffer::new();
        buffer.push(b"\n");
        assert_eq!(buffer.take_line().as_deref(), Some(""));
    }

    #[test]
    fn test_flush_remainder_drains_unterminated_bytes() {
        let mut buffer = LineBuffer::new();
        buffer.push(b"tail without newline");

        assert_eq!(
            buffer.flush_remainder().as_deref(),
            Some("tail without newline")
        );
        assert_eq!(buffer.flush_remainder(), None);
    }

    #[test]
    fn test_split_rejoin_round_trip() {
        let content = b"a,1\nb,2\nc,3\n";
        let mut buffer = LineBuffer::new();
        // Feed in awkward chunk sizes.
        for chunk in content.chunks(5) {
            buffer.push(chunk);
        }

        let mut lines = Vec::new();
        while let Some(line) = buffer.take_line() {
            lines.push(line);
        }
        assert_eq!(lines.join("\n") + "\n", String::from_utf8_lossy(content));
    }
}
