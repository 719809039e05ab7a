use bytes::Bytes;
use rawx_core::ChunkId;
use rawx_storage::FilesystemRepository;
use std::path::Path;

/// Deterministic chunk ID derived from a number.
#[allow(dead_code)]
pub fn chunk_id(n: u64) -> ChunkId {
    ChunkId::parse(&format!("{n:064X}")).unwrap()
}

/// Repository over `root` without fsync, for speed.
#[allow(dead_code)]
pub async fn test_repository(root: &Path) -> FilesystemRepository {
    FilesystemRepository::new(root).await.unwrap().with_fsync(false)
}

/// Generate deterministic test data using a seeded pseudo-random generator
/// Same seed produces same output (reproducible tests)
#[allow(dead_code)]
pub fn seeded_bytes(seed: u64, len: usize) -> Bytes {
    let mut data = vec![0u8; len];
    let mut state = seed;

    // Simple LCG (Linear Congruential Generator)
    for chunk in data.chunks_mut(8) {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        let bytes = state.to_le_bytes();
        for (i, byte) in chunk.iter_mut().enumerate() {
            *byte = bytes[i % 8];
        }
    }

    Bytes::from(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_id_is_canonical() {
        assert_eq!(chunk_id(255).as_str(), format!("{}FF", "0".repeat(62)));
    }

    #[test]
    fn test_seeded_bytes_deterministic() {
        assert_eq!(seeded_bytes(42, 1000), seeded_bytes(42, 1000));
        assert_ne!(seeded_bytes(42, 1000), seeded_bytes(43, 1000));
    }
}
