//! Chunk event notification.
//!
//! Delivery is best effort: the upload pipeline logs and counts failures
//! but never fails a request because of them.

use async_trait::async_trait;
use rawx_core::config::NotifyConfig;
use rawx_core::{ChunkField, ChunkMetadata};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Event type emitted when a chunk is created.
pub const EVENT_CHUNK_NEW: &str = "storage.chunk.new";

/// Errors raised while delivering an event.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification queue is full")]
    QueueFull,

    #[error("notification queue is closed")]
    QueueClosed,

    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A chunk lifecycle event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkEvent {
    pub event_type: String,
    /// Unix timestamp in seconds.
    pub when: i64,
    /// Address of the service holding the chunk.
    pub url: String,
    pub data: ChunkEventData,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkEventData {
    pub chunk_id: String,
    pub container_id: Option<String>,
    pub content_path: Option<String>,
    pub content_version: Option<String>,
    pub content_id: Option<String>,
    pub chunk_position: Option<String>,
    pub chunk_size: Option<u64>,
    pub chunk_hash: Option<String>,
    pub full_path: Option<String>,
}

impl ChunkEvent {
    /// Event announcing a newly committed chunk.
    pub fn chunk_created(meta: &ChunkMetadata, url: &str) -> Self {
        let field = |f: ChunkField| meta.get(f).map(str::to_string);
        Self {
            event_type: EVENT_CHUNK_NEW.to_string(),
            when: time::OffsetDateTime::now_utc().unix_timestamp(),
            url: url.to_string(),
            data: ChunkEventData {
                chunk_id: meta.chunk_id().to_string(),
                container_id: field(ChunkField::ContainerId),
                content_path: field(ChunkField::ContentPath),
                content_version: field(ChunkField::ContentVersion),
                content_id: field(ChunkField::ContentId),
                chunk_position: field(ChunkField::ChunkPosition),
                chunk_size: meta.chunk_size(),
                chunk_hash: field(ChunkField::ChunkHash),
                full_path: meta.full_path().map(str::to_string),
            },
        }
    }
}

/// Sink for chunk events.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    /// Deliver a "chunk created" event.
    async fn notify_new(&self, event: &ChunkEvent) -> Result<(), NotifyError>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Discards every event.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify_new(&self, _event: &ChunkEvent) -> Result<(), NotifyError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

/// Emits events as JSON through `tracing`.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_new(&self, event: &ChunkEvent) -> Result<(), NotifyError> {
        let payload = serde_json::to_string(event)?;
        tracing::info!(
            target: "rawx::events",
            event_type = %event.event_type,
            chunk_id = %event.data.chunk_id,
            event = %payload,
            "Chunk event"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// Forwards events into a bounded queue drained by the embedding process.
pub struct ChannelNotifier {
    tx: mpsc::Sender<ChunkEvent>,
}

impl ChannelNotifier {
    /// Create a notifier and the receiving end of its queue.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<ChunkEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn notify_new(&self, event: &ChunkEvent) -> Result<(), NotifyError> {
        self.tx.try_send(event.clone()).map_err(|e| match e {
            TrySendError::Full(_) => NotifyError::QueueFull,
            TrySendError::Closed(_) => NotifyError::QueueClosed,
        })
    }

    fn name(&self) -> &'static str {
        "channel"
    }
}

/// Build the notifier selected by configuration.
pub fn from_config(config: &NotifyConfig) -> Arc<dyn Notifier> {
    match config {
        NotifyConfig::None => Arc::new(NoopNotifier),
        NotifyConfig::Log => Arc::new(LogNotifier),
    }
}
