use std::fmt;

use bytes::Bytes;

/// What the reassembler concluded about one candidate frame, or about the tail
/// of a chunk that could not form one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Delimiters and checksum are correct.
    Valid(Bytes),
    /// Delimiters are correct but the checksum disagrees. The frame is dropped.
    ChecksumMismatch { expected: u8, actual: u8 },
    /// The start or end marker is not `0x7E`. Parsing continues past the
    /// declared length.
    MalformedDelimiter { start: u8, end: u8 },
    /// A well-delimited zero-length frame.
    NoOp,
    /// The declared length runs past the available bytes; they are held back
    /// until the next chunk.
    Incomplete { missing: usize },
    /// A lone trailing byte, too short to carry a length. It is discarded.
    ShortInput { len: usize },
}

impl FrameOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, FrameOutcome::Valid(_))
    }

    /// True for every outcome other than `Valid` and `NoOp`.
    pub fn is_diagnostic(&self) -> bool {
        !matches!(self, FrameOutcome::Valid(_) | FrameOutcome::NoOp)
    }

    pub fn payload(&self) -> Option<&Bytes> {
        match self {
            FrameOutcome::Valid(payload) => Some(payload),
            _ => None,
        }
    }

    /// Short stable name, used for logs and CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            FrameOutcome::Valid(_) => "valid",
            FrameOutcome::ChecksumMismatch { .. } => "checksum-mismatch",
            FrameOutcome::MalformedDelimiter { .. } => "malformed-delimiter",
            FrameOutcome::NoOp => "no-op",
            FrameOutcome::Incomplete { .. } => "incomplete",
            FrameOutcome::ShortInput { .. } => "short-input",
        }
    }
}

impl fmt::Display for FrameOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameOutcome::Valid(payload) => {
                write!(f, "valid frame [{}]", HexBytes(payload.as_ref()))
            }
            FrameOutcome::ChecksumMismatch { expected, actual } => write!(
                f,
                "checksum mismatch (expected {expected:02x}, got {actual:02x})"
            ),
            FrameOutcome::MalformedDelimiter { start, end } => write!(
                f,
                "bad frame delimiters (start {start:02x}, end {end:02x})"
            ),
            FrameOutcome::NoOp => f.write_str("empty frame"),
            FrameOutcome::Incomplete { missing } => {
                write!(f, "incomplete frame, missing {missing} bytes")
            }
            FrameOutcome::ShortInput { len } => write!(f, "short input ({len} bytes ignored)"),
        }
    }
}

/// Result of feeding one chunk through the reassembler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessReport {
    /// Outcomes in the order their frames appeared.
    pub outcomes: Vec<FrameOutcome>,
    /// Frames whose delimiters checked out (valid, checksum mismatch or no-op).
    pub frames_processed: usize,
}

impl ProcessReport {
    /// Payloads of every valid frame, in arrival order.
    pub fn valid_payloads(&self) -> impl Iterator<Item = &Bytes> {
        self.outcomes.iter().filter_map(FrameOutcome::payload)
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Displays bytes as space-separated lowercase hex pairs.
pub struct HexBytes<'a>(pub &'a [u8]);

impl fmt::Display for HexBytes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for HexBytes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_bytes_formatting() {
        assert_eq!(HexBytes(&[0x7E, 0x05, 0x0A]).to_string(), "7e 05 0a");
        assert_eq!(HexBytes(&[]).to_string(), "");
    }

    #[test]
    fn diagnostic_classification() {
        assert!(!FrameOutcome::Valid(Bytes::from_static(b"x")).is_diagnostic());
        assert!(!FrameOutcome::NoOp.is_diagnostic());
        assert!(FrameOutcome::Incomplete { missing: 3 }.is_diagnostic());
        assert!(FrameOutcome::ShortInput { len: 1 }.is_diagnostic());
        assert!(FrameOutcome::ChecksumMismatch {
            expected: 1,
            actual: 2
        }
        .is_diagnostic());
    }

    #[test]
    fn report_filters_valid_payloads() {
        let report = ProcessReport {
            outcomes: vec![
                FrameOutcome::Valid(Bytes::from_static(b"a")),
                FrameOutcome::MalformedDelimiter {
                    start: 0x00,
                    end: 0x7E,
                },
                FrameOutcome::Valid(Bytes::from_static(b"b")),
            ],
            frames_processed: 2,
        };
        let payloads: Vec<_> = report.valid_payloads().map(|p| p.as_ref()).collect();
        assert_eq!(payloads, vec![b"a".as_ref(), b"b".as_ref()]);
    }

    #[test]
    fn display_mentions_details() {
        let text = FrameOutcome::ChecksumMismatch {
            expected: 0x5C,
            actual: 0x5D,
        }
        .to_string();
        assert!(text.contains("5c") && text.contains("5d"));
        assert_eq!(FrameOutcome::NoOp.kind(), "no-op");
    }
}
