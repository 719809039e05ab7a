//! Test fixtures for generating test data.

use bytes::Bytes;

/// MD5 of `"abc"`, uppercase.
#[allow(dead_code)]
pub const ABC_MD5: &str = "900150983CD24FB0D6963F7D28E17F72";

/// Deterministic chunk ID string derived from a number.
#[allow(dead_code)]
pub fn chunk_id(n: u64) -> String {
    format!("{n:064X}")
}

/// The mandatory metadata headers of a PUT.
#[allow(dead_code)]
pub fn put_headers() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "X-oio-Chunk-Meta-Container-Id",
            "3E32B63E6039FD3104F63BFAE034FADAA823371DD64599A8779BA02B3439A268",
        ),
        ("X-oio-Chunk-Meta-Content-Path", "movie.mp4"),
        ("X-oio-Chunk-Meta-Content-Version", "1456938361143740"),
        ("X-oio-Chunk-Meta-Content-Id", "0123456789ABCDEF0123456789ABCDEF"),
        ("X-oio-Chunk-Meta-Content-Storage-Policy", "SINGLE"),
        ("X-oio-Chunk-Meta-Content-Chunk-Method", "plain/nb_copy=1"),
        ("X-oio-Chunk-Meta-Chunk-Pos", "0"),
    ]
}

/// Uppercase MD5 of `data`.
#[allow(dead_code)]
pub fn md5_hex(data: &[u8]) -> String {
    rawx_core::ChunkHasher::compute(data)
}

/// Generate deterministic test data based on a seed.
#[allow(dead_code)]
pub fn seeded_bytes(seed: u64, len: usize) -> Bytes {
    let mut data = vec![0u8; len];
    let mut state = seed;

    for chunk in data.chunks_mut(8) {
        // Simple LCG for deterministic data
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        let bytes = state.to_le_bytes();
        for (i, byte) in chunk.iter_mut().enumerate() {
            *byte = bytes[i % 8];
        }
    }

    Bytes::from(data)
}
