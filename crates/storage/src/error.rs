//! Storage error types.

use thiserror::Error;

/// Repository operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("chunk not found: {0}")]
    NotFound(String),

    #[error("chunk already exists: {0}")]
    AlreadyExists(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid attributes for {chunk}: {reason}")]
    InvalidAttributes { chunk: String, reason: String },

    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;
