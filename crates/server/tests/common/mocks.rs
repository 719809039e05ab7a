//! Recording collaborators for asserting pipeline side effects.

use async_trait::async_trait;
use bytes::Bytes;
use rawx_core::ChunkId;
use rawx_server::notify::{ChunkEvent, NotifyError};
use rawx_server::Notifier;
use rawx_storage::{ChunkReader, ChunkRepository, ChunkWriter, StorageError, StorageResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Calls observed by a [`RecordingRepository`] and its writers.
#[derive(Default)]
#[allow(dead_code)]
pub struct CallCounts {
    pub put: AtomicUsize,
    pub link: AtomicUsize,
    pub get: AtomicUsize,
    pub delete: AtomicUsize,
    pub commit: AtomicUsize,
    pub abort: AtomicUsize,
}

#[allow(dead_code)]
impl CallCounts {
    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    /// Calls made on the repository itself.
    pub fn repository_calls(&self) -> usize {
        [&self.put, &self.link, &self.get, &self.delete]
            .into_iter()
            .map(Self::count)
            .sum()
    }
}

/// Repository wrapper that counts calls and can fail data writes.
#[allow(dead_code)]
pub struct RecordingRepository {
    inner: Arc<dyn ChunkRepository>,
    pub calls: Arc<CallCounts>,
    fail_writes: AtomicBool,
}

#[allow(dead_code)]
impl RecordingRepository {
    pub fn new(inner: Arc<dyn ChunkRepository>) -> Self {
        Self {
            inner,
            calls: Arc::new(CallCounts::default()),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Make every `write` on writers opened from now on fail.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    fn wrap(&self, inner: Box<dyn ChunkWriter>) -> Box<dyn ChunkWriter> {
        Box::new(RecordingWriter {
            inner,
            calls: self.calls.clone(),
            fail_writes: self.fail_writes.load(Ordering::SeqCst),
        })
    }
}

#[async_trait]
impl ChunkRepository for RecordingRepository {
    async fn put(&self, id: &ChunkId) -> StorageResult<Box<dyn ChunkWriter>> {
        self.calls.put.fetch_add(1, Ordering::SeqCst);
        let writer = self.inner.put(id).await?;
        Ok(self.wrap(writer))
    }

    async fn link(
        &self,
        source: &ChunkId,
        target: &ChunkId,
    ) -> StorageResult<Box<dyn ChunkWriter>> {
        self.calls.link.fetch_add(1, Ordering::SeqCst);
        let writer = self.inner.link(source, target).await?;
        Ok(self.wrap(writer))
    }

    async fn get(&self, id: &ChunkId) -> StorageResult<Box<dyn ChunkReader>> {
        self.calls.get.fetch_add(1, Ordering::SeqCst);
        self.inner.get(id).await
    }

    async fn delete(&self, id: &ChunkId) -> StorageResult<()> {
        self.calls.delete.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(id).await
    }

    fn backend_name(&self) -> &'static str {
        "recording"
    }
}

struct RecordingWriter {
    inner: Box<dyn ChunkWriter>,
    calls: Arc<CallCounts>,
    fail_writes: bool,
}

#[async_trait]
impl ChunkWriter for RecordingWriter {
    async fn write(&mut self, data: Bytes) -> StorageResult<()> {
        if self.fail_writes {
            return Err(StorageError::Io(std::io::Error::other("injected write failure")));
        }
        self.inner.write(data).await
    }

    fn set_attr(&mut self, name: &str, value: &str) {
        self.inner.set_attr(name, value);
    }

    fn bytes_written(&self) -> u64 {
        self.inner.bytes_written()
    }

    async fn commit(self: Box<Self>) -> StorageResult<()> {
        self.calls.commit.fetch_add(1, Ordering::SeqCst);
        self.inner.commit().await
    }

    async fn abort(self: Box<Self>) -> StorageResult<()> {
        self.calls.abort.fetch_add(1, Ordering::SeqCst);
        self.inner.abort().await
    }
}

/// Notifier that rejects every event.
#[derive(Default)]
#[allow(dead_code)]
pub struct FailingNotifier {
    pub attempts: AtomicUsize,
}

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify_new(&self, _event: &ChunkEvent) -> Result<(), NotifyError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(NotifyError::QueueClosed)
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}
