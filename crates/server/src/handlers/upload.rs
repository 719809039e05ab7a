//! PUT: create a chunk from the request body.

use crate::attrs::{ChunkMetadataExt, header_str};
use crate::compression::ChunkSink;
use crate::error::{ApiError, ApiResult};
use crate::notify::ChunkEvent;
use crate::state::AppState;
use axum::body::Body;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::BytesMut;
use http_body_util::BodyExt;
use rawx_core::{BLOCK_SIZE, ChunkHasher, ChunkId, ChunkMetadata, ContentLength};

/// Response header carrying the computed chunk checksum.
pub const CHUNK_HASH_HEADER: &str = "chunkhash";

#[tracing::instrument(skip_all, fields(chunk_id = %chunk_id))]
pub(super) async fn upload_chunk(
    state: &AppState,
    chunk_id: ChunkId,
    headers: &HeaderMap,
    mut body: Body,
) -> ApiResult<Response> {
    let mut meta = ChunkMetadata::from_request_headers(chunk_id.clone(), headers)?;
    let length = ContentLength::from_header(header_str(headers, "content-length")?)?;

    let writer = state.repository.put(&chunk_id).await?;
    let mut sink = ChunkSink::new(writer, state.config.server.compression);

    let (digest, bytes_read) = match write_chunk(state, &mut meta, length, &mut body, &mut sink).await
    {
        Ok(written) => written,
        Err(e) => {
            sink.abort().await;
            return Err(e);
        }
    };
    let bytes_stored = sink.bytes_stored();
    sink.commit().await?;
    state.metrics.bytes_in.inc_by(bytes_read);

    tracing::info!(
        length = %length,
        bytes_read,
        bytes_stored,
        chunk_hash = %digest,
        "Chunk created"
    );

    let event = ChunkEvent::chunk_created(&meta, state.config.server.advertised_url());
    if let Err(e) = state.notifier.notify_new(&event).await {
        state.metrics.notify_failures.inc();
        tracing::warn!(notifier = state.notifier.name(), error = %e, "Failed to publish chunk event");
    }

    Ok((StatusCode::CREATED, [(CHUNK_HASH_HEADER, digest)]).into_response())
}

/// Stream the body into the sink, then verify and queue the metadata.
///
/// Returns the uppercase digest and the number of client bytes read.
async fn write_chunk(
    state: &AppState,
    meta: &mut ChunkMetadata,
    length: ContentLength,
    body: &mut Body,
    sink: &mut ChunkSink,
) -> ApiResult<(String, u64)> {
    let mut hasher = ChunkHasher::new();
    let trailers = stream_body(body, length, sink, &mut hasher).await?;
    sink.finish().await?;

    let bytes_read = hasher.bytes_hashed();
    let digest = hasher.finalize();

    meta.apply_request_trailers(&trailers)?;
    if let Err(e) = meta.seal(&digest, bytes_read) {
        if matches!(
            e,
            rawx_core::Error::HashMismatch { .. } | rawx_core::Error::SizeMismatch { .. }
        ) {
            state.metrics.checksum_mismatches.inc();
        }
        return Err(e.into());
    }
    meta.set_compression(sink.compression_tag());
    meta.save_to(sink.writer_mut());
    Ok((digest, bytes_read))
}

/// Copy the request body into `sink` in blocks of [`BLOCK_SIZE`].
///
/// With a known length exactly that many bytes are consumed and a shorter
/// body is an error. Otherwise the body is read to its end and any trailers
/// are returned.
async fn stream_body(
    body: &mut Body,
    length: ContentLength,
    sink: &mut ChunkSink,
    hasher: &mut ChunkHasher,
) -> ApiResult<HeaderMap> {
    let mut trailers = HeaderMap::new();
    let mut block = BytesMut::with_capacity(BLOCK_SIZE);
    let mut consumed = 0u64;

    loop {
        if length.remaining(consumed) == Some(0) {
            break;
        }
        let Some(frame) = body.frame().await else {
            if let ContentLength::Known(expected) = length {
                return Err(ApiError::BodyRead(format!(
                    "body ended after {consumed} of {expected} bytes"
                )));
            }
            break;
        };
        let frame = frame.map_err(|e| ApiError::BodyRead(e.to_string()))?;

        let frame = match frame.into_data() {
            Ok(mut data) => {
                if let Some(remaining) = length.remaining(consumed)
                    && data.len() as u64 > remaining
                {
                    data.truncate(remaining as usize);
                }
                consumed += data.len() as u64;
                hasher.update(&data);
                block.extend_from_slice(&data);
                while block.len() >= BLOCK_SIZE {
                    sink.write(block.split_to(BLOCK_SIZE).freeze()).await?;
                }
                continue;
            }
            Err(frame) => frame,
        };
        if let Ok(frame_trailers) = frame.into_trailers() {
            trailers.extend(frame_trailers);
        }
    }

    if !block.is_empty() {
        sink.write(block.freeze()).await?;
    }
    Ok(trailers)
}
