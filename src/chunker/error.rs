//! Error type shared by every chunker variant.
//!
//! Mirrors the rest of this codebase's approach to error handling: small,
//! explicit enums rather than a catch-all string, with an `io::Error`
//! carrying variant for failures that originate below the chunking layer.

use std::fmt;
use std::io;

/// Unified error type for construction-time validation and runtime chunking
/// failures.
#[derive(Debug)]
pub enum ChunkerError {
    /// A read or seek on the underlying source failed. Carries the
    /// original `io::Error` (errno, kind, and source name where available)
    /// unchanged.
    Io(io::Error),
    /// Invalid chunker configuration, detected at construction: an unknown
    /// algorithm name, a bad failing-chunker map string, `max_size`
    /// exceeding the zero-buffer length, or `window_size + min_size + 1 >
    /// max_size`.
    Config(String),
    /// The content-defined chunker reached EOF with `bytes_read !=
    /// bytes_yielded`. Indicates a bug in the refill/emit bookkeeping, not
    /// a bad input — callers should treat this as fatal.
    Consistency { bytes_read: u64, bytes_yielded: u64 },
}

impl fmt::Display for ChunkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkerError::Io(e) => write!(f, "chunker I/O error: {e}"),
            ChunkerError::Config(msg) => write!(f, "invalid chunker configuration: {msg}"),
            ChunkerError::Consistency { bytes_read, bytes_yielded } => write!(
                f,
                "internal consistency error: bytes_read ({bytes_read}) != bytes_yielded ({bytes_yielded})"
            ),
        }
    }
}

impl std::error::Error for ChunkerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChunkerError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ChunkerError {
    fn from(e: io::Error) -> Self {
        ChunkerError::Io(e)
    }
}

/// Builds the `io::Error` used for the failing chunker's simulated fault.
/// `std::io::ErrorKind` has no first-class `EIO`, so this encodes the
/// simulated errno in an `Other`-kind error with a descriptive message.
pub fn simulated_eio(context: &str) -> io::Error {
    io::Error::other(format!("simulated EIO: {context}"))
}
