pub mod fixtures;

#[allow(unused_imports)]
pub use fixtures::{chunk_id, seeded_bytes, test_repository};
