//! Local filesystem chunk repository.
//!
//! Chunks live under `<root>/<prefix dirs>/<CHUNKID>`, with attributes in a
//! JSON sidecar `<CHUNKID>.attr` next to the data. New chunks are staged in
//! `<CHUNKID>.pending.<uuid>`. Commit hard-links the attribute record into
//! place and then the data file, neither step replacing an existing entry, so
//! concurrent creators of one ID cannot overwrite each other.

use crate::error::{StorageError, StorageResult};
use crate::traits::{Attributes, ChunkReader, ChunkRepository, ChunkWriter};
use async_trait::async_trait;
use bytes::Bytes;
use rawx_core::ChunkId;
use rawx_core::metadata::ATTR_CHUNK_ID;
use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::fs;
use tokio::io::{AsyncRead, AsyncSeekExt, AsyncWriteExt, ReadBuf};
use tracing::{instrument, warn};
use uuid::Uuid;

const ATTR_SUFFIX: &str = ".attr";
const PENDING_SUFFIX: &str = ".pending.";

/// Local filesystem chunk repository.
pub struct FilesystemRepository {
    root: PathBuf,
    hash_width: usize,
    hash_depth: usize,
    fsync: bool,
}

impl FilesystemRepository {
    /// Create a repository rooted at `root` with the default layout
    /// (one directory level of three hex characters, fsync on commit).
    pub async fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self {
            root,
            hash_width: 3,
            hash_depth: 1,
            fsync: true,
        })
    }

    /// Spread chunks over `hash_depth` directory levels of `hash_width`
    /// characters each.
    pub fn with_layout(mut self, hash_width: usize, hash_depth: usize) -> StorageResult<Self> {
        if (hash_width == 0 && hash_depth > 0)
            || hash_width.saturating_mul(hash_depth) > rawx_core::CHUNK_ID_LEN
        {
            return Err(StorageError::Config(format!(
                "unusable directory layout: width {hash_width}, depth {hash_depth}"
            )));
        }
        self.hash_width = hash_width;
        self.hash_depth = hash_depth;
        Ok(self)
    }

    pub fn with_fsync(mut self, fsync: bool) -> Self {
        self.fsync = fsync;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the data file for `id`.
    ///
    /// Chunk IDs are validated hex, so the path can never leave the root.
    pub fn chunk_path(&self, id: &ChunkId) -> PathBuf {
        let mut path = self.root.clone();
        for segment in id.prefix_segments(self.hash_width, self.hash_depth) {
            path.push(segment);
        }
        path.push(id.as_str());
        path
    }

    /// Path of the attribute record for `id`.
    pub fn attr_path(&self, id: &ChunkId) -> PathBuf {
        sibling(&self.chunk_path(id), id, ATTR_SUFFIX)
    }

    async fn ensure_parent(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    async fn load_attributes(&self, id: &ChunkId) -> StorageResult<Attributes> {
        match fs::read(self.attr_path(id)).await {
            Ok(raw) => serde_json::from_slice(&raw).map_err(|e| StorageError::InvalidAttributes {
                chunk: id.to_string(),
                reason: e.to_string(),
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Attributes::new()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn writer(
        &self,
        id: &ChunkId,
        file: Option<fs::File>,
        temp_path: PathBuf,
        attrs: Attributes,
    ) -> Box<dyn ChunkWriter> {
        let final_path = self.chunk_path(id);
        Box::new(FilesystemWriter {
            id: id.clone(),
            file,
            attr_path: sibling(&final_path, id, ATTR_SUFFIX),
            temp_path,
            final_path,
            attrs,
            bytes_written: 0,
            fsync: self.fsync,
            finished: false,
        })
    }
}

fn sibling(data_path: &Path, id: &ChunkId, suffix: &str) -> PathBuf {
    data_path.with_file_name(format!("{id}{suffix}"))
}

fn staging_path(data_path: &Path, id: &ChunkId) -> PathBuf {
    sibling(data_path, id, &format!("{PENDING_SUFFIX}{}", Uuid::new_v4()))
}

async fn link_no_clobber(from: &Path, to: &Path, id: &ChunkId) -> StorageResult<()> {
    fs::hard_link(from, to).await.map_err(|e| match e.kind() {
        ErrorKind::AlreadyExists => StorageError::AlreadyExists(id.to_string()),
        _ => StorageError::Io(e),
    })
}

async fn remove_staged(path: &Path, id: &ChunkId) {
    if let Err(e) = fs::remove_file(path).await
        && e.kind() != ErrorKind::NotFound
    {
        warn!(chunk_id = %id, error = %e, path = %path.display(), "Failed to remove staged file");
    }
}

fn not_found(id: &ChunkId, e: std::io::Error) -> StorageError {
    if e.kind() == ErrorKind::NotFound {
        StorageError::NotFound(id.to_string())
    } else {
        StorageError::Io(e)
    }
}

#[async_trait]
impl ChunkRepository for FilesystemRepository {
    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn put(&self, id: &ChunkId) -> StorageResult<Box<dyn ChunkWriter>> {
        let path = self.chunk_path(id);
        if fs::try_exists(&path).await? {
            return Err(StorageError::AlreadyExists(id.to_string()));
        }
        self.ensure_parent(&path).await?;

        let temp_path = staging_path(&path, id);
        let file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)
            .await?;

        Ok(self.writer(id, Some(file), temp_path, Attributes::new()))
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn link(
        &self,
        source: &ChunkId,
        target: &ChunkId,
    ) -> StorageResult<Box<dyn ChunkWriter>> {
        let source_path = self.chunk_path(source);
        let target_path = self.chunk_path(target);

        if !fs::try_exists(&source_path).await? {
            return Err(StorageError::NotFound(source.to_string()));
        }
        if fs::try_exists(&target_path).await? {
            return Err(StorageError::AlreadyExists(target.to_string()));
        }

        let mut attrs = self.load_attributes(source).await?;
        attrs.insert(ATTR_CHUNK_ID.to_string(), target.to_string());

        self.ensure_parent(&target_path).await?;
        let temp_path = staging_path(&target_path, target);
        fs::hard_link(&source_path, &temp_path)
            .await
            .map_err(|e| not_found(source, e))?;

        Ok(self.writer(target, None, temp_path, attrs))
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn get(&self, id: &ChunkId) -> StorageResult<Box<dyn ChunkReader>> {
        // Data before attributes: commit publishes them in the opposite order.
        let file = fs::File::open(self.chunk_path(id))
            .await
            .map_err(|e| not_found(id, e))?;
        let size = file.metadata().await?.len();
        let attrs = self.load_attributes(id).await?;

        Ok(Box::new(FilesystemReader { file, size, attrs }))
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn delete(&self, id: &ChunkId) -> StorageResult<()> {
        fs::remove_file(self.chunk_path(id))
            .await
            .map_err(|e| not_found(id, e))?;
        match fs::remove_file(self.attr_path(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn backend_name(&self) -> &'static str {
        "filesystem"
    }

    async fn health_check(&self) -> StorageResult<()> {
        let meta = fs::metadata(&self.root).await?;
        if !meta.is_dir() {
            return Err(StorageError::Config(format!(
                "storage root is not a directory: {}",
                self.root.display()
            )));
        }
        Ok(())
    }
}

/// Writer staging a chunk in a temp file until commit.
///
/// `file` is `None` for writers created by `link`, whose staged file is a
/// hard link to existing bytes.
struct FilesystemWriter {
    id: ChunkId,
    file: Option<fs::File>,
    temp_path: PathBuf,
    final_path: PathBuf,
    attr_path: PathBuf,
    attrs: Attributes,
    bytes_written: u64,
    fsync: bool,
    finished: bool,
}

impl FilesystemWriter {
    /// Publish the attribute record, then the data file.
    ///
    /// Both steps are no-clobber hard links. `get` opens the data file before
    /// reading attributes, so any reader that finds the bytes also finds the
    /// complete record.
    async fn publish(&mut self) -> StorageResult<()> {
        if let Some(mut file) = self.file.take() {
            file.flush().await?;
            if self.fsync {
                file.sync_all().await?;
            }
        }

        let staged_attrs = self.stage_attributes().await?;
        let linked = link_no_clobber(&staged_attrs, &self.attr_path, &self.id).await;
        remove_staged(&staged_attrs, &self.id).await;
        linked?;

        // First writer wins: hard_link never replaces an existing entry.
        if let Err(e) = link_no_clobber(&self.temp_path, &self.final_path, &self.id).await {
            // The sidecar was created by this writer, so it is ours to remove.
            if let Err(e) = fs::remove_file(&self.attr_path).await {
                warn!(chunk_id = %self.id, error = %e, "Failed to remove orphaned attribute record");
            }
            return Err(e);
        }

        remove_staged(&self.temp_path, &self.id).await;
        Ok(())
    }

    /// Write the attribute record to a staging file and return its path.
    async fn stage_attributes(&self) -> StorageResult<PathBuf> {
        let encoded = serde_json::to_vec(&self.attrs).map_err(|e| {
            StorageError::InvalidAttributes {
                chunk: self.id.to_string(),
                reason: e.to_string(),
            }
        })?;

        let temp_path = sibling(
            &self.attr_path,
            &self.id,
            &format!("{ATTR_SUFFIX}{PENDING_SUFFIX}{}", Uuid::new_v4()),
        );
        let result = async {
            let mut file = fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&temp_path)
                .await?;
            file.write_all(&encoded).await?;
            if self.fsync {
                file.sync_all().await?;
            }
            Ok::<_, std::io::Error>(())
        }
        .await;

        if let Err(e) = result {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StorageError::Io(e));
        }
        Ok(temp_path)
    }

    async fn discard(&mut self) {
        self.file = None;
        match fs::remove_file(&self.temp_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                warn!(chunk_id = %self.id, error = %e, "Failed to remove staged chunk file")
            }
        }
    }
}

#[async_trait]
impl ChunkWriter for FilesystemWriter {
    async fn write(&mut self, data: Bytes) -> StorageResult<()> {
        let file = self
            .file
            .as_mut()
            .ok_or(StorageError::Unsupported("write on a linked chunk"))?;
        file.write_all(&data).await?;
        self.bytes_written += data.len() as u64;
        Ok(())
    }

    fn set_attr(&mut self, name: &str, value: &str) {
        self.attrs.insert(name.to_string(), value.to_string());
    }

    fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    async fn commit(mut self: Box<Self>) -> StorageResult<()> {
        let result = self.publish().await;
        if result.is_err() {
            self.discard().await;
        }
        self.finished = true;
        result
    }

    async fn abort(mut self: Box<Self>) -> StorageResult<()> {
        self.discard().await;
        self.finished = true;
        Ok(())
    }
}

impl Drop for FilesystemWriter {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        warn!(chunk_id = %self.id, "Chunk writer dropped without commit or abort, aborting");
        self.file = None;
        if let Err(e) = std::fs::remove_file(&self.temp_path)
            && e.kind() != ErrorKind::NotFound
        {
            warn!(chunk_id = %self.id, error = %e, "Failed to remove staged chunk file");
        }
    }
}

/// Reader over a committed chunk file.
struct FilesystemReader {
    file: fs::File,
    size: u64,
    attrs: Attributes,
}

impl AsyncRead for FilesystemReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.file).poll_read(cx, buf)
    }
}

#[async_trait]
impl ChunkReader for FilesystemReader {
    fn size(&self) -> u64 {
        self.size
    }

    async fn seek(&mut self, offset: u64) -> StorageResult<()> {
        self.file.seek(SeekFrom::Start(offset)).await?;
        Ok(())
    }

    fn attributes(&self) -> &Attributes {
        &self.attrs
    }
}
