//! Chunk compression on the upload path.
//!
//! Client bytes go through an optional zlib encoder before reaching the
//! storage writer. The encoder keeps its dictionary across blocks; whatever
//! it emits is drained into the writer after each block, so memory stays
//! bounded by the block size.

use async_compression::tokio::write::ZlibEncoder;
use bytes::Bytes;
use rawx_core::config::CompressionConfig;
use rawx_storage::{ChunkWriter, StorageResult};
use tokio::io::AsyncWriteExt;

/// Storage writer fronted by the configured compression filter.
pub struct ChunkSink {
    writer: Box<dyn ChunkWriter>,
    encoder: Option<ZlibEncoder<Vec<u8>>>,
    compression: CompressionConfig,
}

impl ChunkSink {
    pub fn new(writer: Box<dyn ChunkWriter>, compression: CompressionConfig) -> Self {
        let encoder = match compression {
            CompressionConfig::None => None,
            CompressionConfig::Zlib => Some(ZlibEncoder::with_quality(
                Vec::new(),
                async_compression::Level::Default,
            )),
        };
        Self {
            writer,
            encoder,
            compression,
        }
    }

    /// Push one block of client bytes.
    pub async fn write(&mut self, data: Bytes) -> StorageResult<()> {
        match &mut self.encoder {
            None => self.writer.write(data).await,
            Some(encoder) => {
                encoder.write_all(&data).await?;
                let out = std::mem::take(encoder.get_mut());
                if out.is_empty() {
                    return Ok(());
                }
                self.writer.write(Bytes::from(out)).await
            }
        }
    }

    /// Flush the encoder tail into the writer.
    pub async fn finish(&mut self) -> StorageResult<()> {
        if let Some(encoder) = &mut self.encoder {
            encoder.shutdown().await?;
            let tail = std::mem::take(encoder.get_mut());
            if !tail.is_empty() {
                self.writer.write(Bytes::from(tail)).await?;
            }
        }
        Ok(())
    }

    /// Compression tag to persist with the chunk, if any.
    pub fn compression_tag(&self) -> Option<&'static str> {
        self.compression.tag()
    }

    /// Bytes handed to storage so far.
    pub fn bytes_stored(&self) -> u64 {
        self.writer.bytes_written()
    }

    pub fn writer_mut(&mut self) -> &mut dyn ChunkWriter {
        self.writer.as_mut()
    }

    pub async fn commit(self) -> StorageResult<()> {
        self.writer.commit().await
    }

    /// Discard the staged chunk; failures are only logged.
    pub async fn abort(self) {
        if let Err(e) = self.writer.abort().await {
            tracing::warn!(error = %e, "Failed to abort chunk writer");
        }
    }
}
