//! Chunk identifiers.

use crate::CHUNK_ID_LEN;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A validated chunk identifier: 64 hexadecimal characters, uppercase.
///
/// Construction always goes through [`ChunkId::parse`], so any value of this
/// type is in canonical form and can be used directly as a storage key.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChunkId(String);

impl ChunkId {
    /// Validate and canonicalize a candidate identifier.
    pub fn parse(s: &str) -> crate::Result<Self> {
        if !is_hex_string(s, CHUNK_ID_LEN) {
            return Err(crate::Error::InvalidChunkId(format!(
                "expected {CHUNK_ID_LEN} hex chars, got {s:?}"
            )));
        }
        Ok(Self(s.to_ascii_uppercase()))
    }

    /// Extract and validate the identifier from a request path.
    ///
    /// Only the trailing path segment is considered; trailing slashes are
    /// ignored.
    pub fn from_path(path: &str) -> crate::Result<Self> {
        let trimmed = path.trim_end_matches('/');
        let segment = trimmed.rsplit('/').next().unwrap_or(trimmed);
        Self::parse(segment)
    }

    /// Canonical string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Directory prefix used to spread chunks over `depth` levels of
    /// `width` characters each.
    pub fn prefix_segments(&self, width: usize, depth: usize) -> Vec<&str> {
        (0..depth)
            .map(|level| &self.0[level * width..(level + 1) * width])
            .collect()
    }
}

/// Whether `s` is exactly `len` ASCII hexadecimal characters.
pub fn is_hex_string(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| b.is_ascii_hexdigit())
}

impl FromStr for ChunkId {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ChunkId {
    type Error = crate::Error;

    fn try_from(s: String) -> crate::Result<Self> {
        Self::parse(&s)
    }
}

impl From<ChunkId> for String {
    fn from(id: ChunkId) -> Self {
        id.0
    }
}

impl AsRef<str> for ChunkId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkId({})", &self.0[..16])
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOWER: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    #[test]
    fn test_parse_canonicalizes_to_uppercase() {
        let id = ChunkId::parse(LOWER).unwrap();
        assert_eq!(id.as_str(), LOWER.to_ascii_uppercase());
        assert_eq!(id.as_str().len(), 64);
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        assert!(ChunkId::parse(&LOWER[..63]).is_err());
        assert!(ChunkId::parse(&format!("{LOWER}0")).is_err());
        assert!(ChunkId::parse("").is_err());
    }

    #[test]
    fn test_parse_rejects_non_hex() {
        let bad = format!("{}g", &LOWER[..63]);
        assert!(matches!(
            ChunkId::parse(&bad),
            Err(crate::Error::InvalidChunkId(_))
        ));
    }

    #[test]
    fn test_from_path_uses_trailing_segment() {
        let id = ChunkId::from_path(&format!("/some/volume/{LOWER}")).unwrap();
        assert_eq!(id.as_str(), LOWER.to_ascii_uppercase());

        let id = ChunkId::from_path(&format!("/{LOWER}/")).unwrap();
        assert_eq!(id.as_str(), LOWER.to_ascii_uppercase());

        assert!(ChunkId::from_path("/").is_err());
        assert!(ChunkId::from_path(&format!("/{LOWER}/extra")).is_err());
    }

    #[test]
    fn test_prefix_segments() {
        let id = ChunkId::parse(LOWER).unwrap();
        assert_eq!(id.prefix_segments(3, 1), vec!["012"]);
        assert_eq!(id.prefix_segments(2, 2), vec!["01", "23"]);
        assert!(id.prefix_segments(3, 0).is_empty());
    }

    #[test]
    fn test_serde_rejects_invalid_id() {
        let ok: ChunkId = serde_json::from_str(&format!("\"{LOWER}\"")).unwrap();
        assert_eq!(ok.as_str(), LOWER.to_ascii_uppercase());
        assert!(serde_json::from_str::<ChunkId>("\"ABC\"").is_err());
    }
}
