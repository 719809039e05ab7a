//! Single byte-range requests.

/// A byte range taken from a `Range: bytes=<offset>-<last>` header.
///
/// Invariant: `size >= 2`, since a range whose last byte does not exceed its
/// offset is rejected at parse time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RangeSpec {
    pub offset: u64,
    pub size: u64,
}

impl RangeSpec {
    /// Parse a single-range header value.
    ///
    /// Exactly two non-negative integers no greater than `i64::MAX` are
    /// accepted. Suffix ranges
    /// (`bytes=-N`), open ranges (`bytes=N-`) and multiple ranges are all
    /// rejected.
    pub fn parse(value: &str) -> crate::Result<Self> {
        let invalid = || crate::Error::InvalidRange(value.to_string());

        let spec = value.trim().strip_prefix("bytes=").ok_or_else(invalid)?;
        let (first, last) = spec.split_once('-').ok_or_else(invalid)?;
        let offset = parse_position(first).ok_or_else(invalid)?;
        let last = parse_position(last).ok_or_else(invalid)?;

        if last <= offset {
            return Err(invalid());
        }

        Ok(Self {
            offset,
            size: last - offset + 1,
        })
    }

    /// Last byte position covered by the range (inclusive).
    pub fn last(&self) -> u64 {
        self.offset + self.size - 1
    }

    /// Clamp the range to a chunk of `total` bytes.
    ///
    /// Returns `None` when the range starts at or beyond the end of the chunk.
    pub fn clamp_to(self, total: u64) -> Option<Self> {
        if self.offset >= total {
            return None;
        }
        Some(Self {
            offset: self.offset,
            size: self.size.min(total - self.offset),
        })
    }
}

fn parse_position(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<u64>()
        .ok()
        .filter(|&position| position <= MAX_POSITION)
}

/// Largest byte position a range may name.
const MAX_POSITION: u64 = i64::MAX as u64;
