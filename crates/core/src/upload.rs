//! Declared upload lengths.

use std::fmt;

/// How many bytes the client announced for an upload body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentLength {
    /// A `Content-Length` was sent: read exactly this many bytes.
    Known(u64),
    /// No length was sent (chunked transfer): read until end of stream.
    Unbounded,
}

impl ContentLength {
    /// Parse an optional `Content-Length` header value.
    pub fn from_header(value: Option<&str>) -> crate::Result<Self> {
        match value {
            None => Ok(Self::Unbounded),
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Self::Known)
                .map_err(|e| crate::Error::invalid_header("Content-Length", e.to_string())),
        }
    }

    /// Upper bound for the next read given `consumed` bytes already taken,
    /// or `None` when the stream is unbounded.
    pub fn remaining(&self, consumed: u64) -> Option<u64> {
        match self {
            Self::Known(total) => Some(total.saturating_sub(consumed)),
            Self::Unbounded => None,
        }
    }
}

impl fmt::Display for ContentLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(n) => write!(f, "{n} bytes"),
            Self::Unbounded => f.write_str("unbounded"),
        }
    }
}
