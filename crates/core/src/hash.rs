//! Chunk checksum computation.

use md5::{Digest, Md5};

/// Incremental MD5 hasher producing the uppercase hex digest stored as the
/// chunk hash.
#[derive(Clone, Default)]
pub struct ChunkHasher {
    inner: Md5,
    bytes: u64,
}

impl ChunkHasher {
    /// Create a new hasher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the hasher with data.
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
        self.bytes += data.len() as u64;
    }

    /// Number of bytes hashed so far.
    pub fn bytes_hashed(&self) -> u64 {
        self.bytes
    }

    /// Finalize and return the uppercase hex digest.
    pub fn finalize(self) -> String {
        hex::encode_upper(self.inner.finalize())
    }

    /// Hash a complete buffer.
    pub fn compute(data: &[u8]) -> String {
        let mut hasher = Self::new();
        hasher.update(data);
        hasher.finalize()
    }
}

/// Compare a declared digest against a computed one, ignoring case.
pub fn verify_digest(declared: &str, computed: &str) -> crate::Result<()> {
    if declared.eq_ignore_ascii_case(computed) {
        Ok(())
    } else {
        Err(crate::Error::HashMismatch {
            expected: declared.to_string(),
            actual: computed.to_string(),
        })
    }
}
