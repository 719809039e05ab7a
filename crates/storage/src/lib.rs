//! Chunk repository abstraction and backends for rawx.
//!
//! This crate provides:
//! - Write handles with commit-or-abort semantics
//! - Read handles with seek and attribute lookup
//! - Hard-link aliasing of existing chunks
//! - A local filesystem backend

pub mod backends;
pub mod error;
pub mod traits;

pub use backends::filesystem::FilesystemRepository;
pub use error::{StorageError, StorageResult};
pub use traits::{Attributes, ChunkReader, ChunkRepository, ChunkWriter};

use rawx_core::config::StorageConfig;
use std::sync::Arc;

/// Create a chunk repository from configuration.
pub async fn from_config(config: &StorageConfig) -> StorageResult<Arc<dyn ChunkRepository>> {
    config.validate().map_err(StorageError::Config)?;

    match config {
        StorageConfig::Filesystem {
            path,
            hash_width,
            hash_depth,
            fsync,
        } => {
            let backend = FilesystemRepository::new(path)
                .await?
                .with_layout(*hash_width, *hash_depth)?
                .with_fsync(*fsync);
            Ok(Arc::new(backend))
        }
    }
}
