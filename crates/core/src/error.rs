//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
///
/// Every variant is a validation failure detected before any durable side
/// effect takes place.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid chunk ID: {0}")]
    InvalidChunkId(String),

    #[error("missing mandatory header: {0}")]
    MissingHeader(&'static str),

    #[error("invalid header {name}: {reason}")]
    InvalidHeader { name: &'static str, reason: String },

    #[error("invalid range: {0}")]
    InvalidRange(String),

    #[error("hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },

    #[error("size mismatch: declared {declared} bytes, received {actual}")]
    SizeMismatch { declared: u64, actual: u64 },
}

impl Error {
    /// Build an [`Error::InvalidHeader`] for the given header name.
    pub fn invalid_header(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidHeader {
            name,
            reason: reason.into(),
        }
    }
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
