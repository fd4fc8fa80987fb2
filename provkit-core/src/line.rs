//! Line framing for device console output
//!
//! The device writes newline-terminated text with no length prefix, so bytes
//! arrive in arbitrary chunks. [`LineBuffer`] reassembles them into lines and
//! [`decode_lenient`] turns each line into text without ever failing.

use bytes::BytesMut;

/// Accumulates received bytes and splits them into lines
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: BytesMut,
}

impl LineBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(256),
        }
    }

    /// Append received bytes
    pub fn extend(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Take the next complete line, terminator included
    pub fn next_line(&mut self) -> Option<BytesMut> {
        let end = self.buf.iter().position(|&b| b == b'\n')?;
        Some(self.buf.split_to(end + 1))
    }

    /// Take whatever is buffered, complete line or not
    pub fn take_remaining(&mut self) -> BytesMut {
        self.buf.split()
    }

    /// Drop everything buffered
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

/// Decode bytes as UTF-8, dropping invalid sequences
pub fn decode_lenient(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    text
}

/// Strip a trailing LF or CR/LF
pub fn trim_terminator(line: &str) -> &str {
    line.trim_end_matches(['\r', '\n'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_split_lines_across_chunks() {
        let mut lines = LineBuffer::new();
        lines.extend(b"ACK\r\nMe");
        lines.extend(b"nu\r\n");

        assert_eq!(&lines.next_line().unwrap()[..], b"ACK\r\n");
        assert_eq!(&lines.next_line().unwrap()[..], b"Menu\r\n");
        assert!(lines.next_line().is_none());
        assert!(lines.is_empty());
    }

    #[test]
    fn test_partial_line_stays_buffered() {
        let mut lines = LineBuffer::new();
        lines.extend(b"no newline yet");

        assert!(lines.next_line().is_none());
        assert_eq!(lines.len(), 14);
        assert_eq!(&lines.take_remaining()[..], b"no newline yet");
        assert!(lines.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut lines = LineBuffer::new();
        lines.extend(b"stale\r\n");
        lines.clear();
        assert!(lines.next_line().is_none());
    }

    #[test]
    fn test_decode_drops_invalid_bytes() {
        assert_eq!(decode_lenient(b"Thing\xFFName\r\n"), "ThingName\r\n");
        assert_eq!(decode_lenient(b"\xC3\x28ok"), "(ok");
        assert_eq!(decode_lenient("caf\u{e9}".as_bytes()), "caf\u{e9}");
    }

    #[test]
    fn test_trim_terminator() {
        assert_eq!(trim_terminator("ACK\r\n"), "ACK");
        assert_eq!(trim_terminator("ACK\n"), "ACK");
        assert_eq!(trim_terminator("ACK"), "ACK");
    }

    proptest! {
        #[test]
        fn decode_never_loses_valid_suffix(
            noise in proptest::collection::vec(any::<u8>(), 0..32),
            tail in "[a-zA-Z0-9 ]{1,32}"
        ) {
            let mut bytes = noise.clone();
            // Terminate any dangling multi-byte prefix so the tail decodes on its own
            bytes.push(b'\n');
            bytes.extend_from_slice(tail.as_bytes());

            let text = decode_lenient(&bytes);
            prop_assert!(text.ends_with(&tail));
        }

        #[test]
        fn lines_are_reassembled_regardless_of_chunking(split in 0usize..12) {
            let data = b"first\r\nsecond\r\n";
            let split = split.min(data.len());
            let mut lines = LineBuffer::new();
            lines.extend(&data[..split]);
            lines.extend(&data[split..]);

            prop_assert_eq!(&lines.next_line().unwrap()[..], &b"first\r\n"[..]);
            prop_assert_eq!(&lines.next_line().unwrap()[..], &b"second\r\n"[..]);
        }
    }
}
