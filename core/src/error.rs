//! Crate-boundary error types outside the word codec's own `WordError`.

use std::fmt;

/// Raised by [`crate::chip::Chip::load_via_boot_stream`] when the supplied
/// byte sequence is structurally malformed — a programmer bug, not a
/// recoverable runtime condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootIntegrityError {
    /// The frame did not start with the expected magic byte.
    BadMagic { expected: u8, found: u8 },
    /// The byte stream ended before the declared frame length was reached.
    TruncatedFrame { expected_words: usize, got_bytes: usize },
    /// No boot node was registered on the chip to receive the stream.
    UnknownBootNode(crate::coord::Coord),
}

impl fmt::Display for BootIntegrityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootIntegrityError::BadMagic { expected, found } => {
                write!(f, "boot stream magic byte {found:#x} does not match expected {expected:#x}")
            }
            BootIntegrityError::TruncatedFrame { expected_words, got_bytes } => write!(
                f,
                "boot stream truncated: expected {expected_words} words, only {got_bytes} bytes available"
            ),
            BootIntegrityError::UnknownBootNode(coord) => {
                write!(f, "node {coord} is not a registered boot node")
            }
        }
    }
}

impl std::error::Error for BootIntegrityError {}
