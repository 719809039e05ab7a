//! Storage trait definitions.

use crate::error::StorageResult;
use async_trait::async_trait;
use bytes::Bytes;
use rawx_core::ChunkId;
use std::collections::BTreeMap;
use tokio::io::AsyncRead;

/// Persisted attributes of a chunk, keyed by attribute name.
pub type Attributes = BTreeMap<String, String>;

/// Chunk repository abstraction.
///
/// Chunks are immutable once committed. Creation goes through a
/// [`ChunkWriter`] so that bytes and attributes become visible together, or
/// not at all.
#[async_trait]
pub trait ChunkRepository: Send + Sync + 'static {
    /// Open a writer for a new chunk.
    ///
    /// Fails with `AlreadyExists` when the chunk is already present.
    async fn put(&self, id: &ChunkId) -> StorageResult<Box<dyn ChunkWriter>>;

    /// Open a writer that aliases the bytes of `source` under `target`.
    ///
    /// The writer starts from a copy of the source's attributes. Data writes
    /// are not supported on such a writer.
    async fn link(&self, source: &ChunkId, target: &ChunkId)
    -> StorageResult<Box<dyn ChunkWriter>>;

    /// Open a committed chunk for reading.
    async fn get(&self, id: &ChunkId) -> StorageResult<Box<dyn ChunkReader>>;

    /// Delete a chunk and its attributes.
    async fn delete(&self, id: &ChunkId) -> StorageResult<()>;

    /// Get the name of this storage backend.
    ///
    /// Returns a static string identifier for the backend type (e.g., "filesystem").
    /// Used for metrics and logging.
    fn backend_name(&self) -> &'static str;

    /// Verify the backend is usable.
    ///
    /// Called during server startup before accepting requests. The default
    /// implementation returns Ok(()).
    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}

/// Write handle for a chunk being created.
///
/// Exactly one of [`commit`](ChunkWriter::commit) or
/// [`abort`](ChunkWriter::abort) ends the handle. A handle dropped without
/// either is aborted.
#[async_trait]
pub trait ChunkWriter: Send {
    /// Append data to the chunk.
    async fn write(&mut self, data: Bytes) -> StorageResult<()>;

    /// Record an attribute to persist on commit.
    fn set_attr(&mut self, name: &str, value: &str);

    /// Total bytes accepted by `write` so far.
    fn bytes_written(&self) -> u64;

    /// Make the chunk and its attributes durably visible.
    async fn commit(self: Box<Self>) -> StorageResult<()>;

    /// Discard everything written through this handle.
    async fn abort(self: Box<Self>) -> StorageResult<()>;
}

/// Read handle over a committed chunk.
///
/// The handle is released when dropped.
#[async_trait]
pub trait ChunkReader: AsyncRead + Send + Unpin {
    /// Chunk length in bytes.
    fn size(&self) -> u64;

    /// Position subsequent reads at `offset` bytes from the start.
    async fn seek(&mut self, offset: u64) -> StorageResult<()>;

    /// Look up a single persisted attribute.
    fn get_attr(&self, name: &str) -> Option<&str> {
        self.attributes().get(name).map(String::as_str)
    }

    /// All persisted attributes.
    fn attributes(&self) -> &Attributes;
}
