//! GET: stream a chunk, whole or by byte range.

use crate::attrs::{ChunkMetadataExt, header_str};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::Response;
use futures::StreamExt;
use rawx_core::{BLOCK_SIZE, ChunkId, ChunkMetadata, RangeSpec};
use tokio::io::AsyncReadExt;
use tokio_util::io::ReaderStream;

#[tracing::instrument(skip_all, fields(chunk_id = %chunk_id))]
pub(super) async fn download_chunk(
    state: &AppState,
    chunk_id: ChunkId,
    headers: &HeaderMap,
) -> ApiResult<Response> {
    let mut reader = state.repository.get(&chunk_id).await?;
    let meta = ChunkMetadata::load_from(chunk_id.clone(), &*reader);
    let total = reader.size();

    let requested = header_str(headers, "range")?
        .map(RangeSpec::parse)
        .transpose()?;

    // Stored bytes are served verbatim; decompression on read is not supported.
    if let Some(tag) = meta.compression() {
        return Err(ApiError::CompressionNotManaged(tag.to_string()));
    }

    let range = match requested {
        Some(range) => Some(range.clamp_to(total).ok_or(ApiError::RangeNotSatisfiable {
            offset: range.offset,
            size: total,
        })?),
        None => None,
    };
    if let Some(range) = range
        && range.offset > 0
    {
        reader.seek(range.offset).await?;
    }

    let mut response_headers = HeaderMap::new();
    meta.fill_headers(&mut response_headers);
    response_headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));

    let (status, length) = match range {
        Some(range) => {
            let content_range = format!(
                "bytes {}-{}/{}",
                range.offset,
                range.offset + range.size,
                range.size
            );
            response_headers.insert(
                header::CONTENT_RANGE,
                HeaderValue::try_from(content_range)
                    .map_err(|e| ApiError::Internal(e.to_string()))?,
            );
            (StatusCode::PARTIAL_CONTENT, range.size)
        }
        None => (StatusCode::OK, total),
    };
    response_headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));

    match range {
        Some(range) => tracing::debug!(
            length,
            first = range.offset,
            last = range.last(),
            "Serving chunk range"
        ),
        None => tracing::debug!(length, "Serving chunk"),
    }

    let (status, body) = if length == 0 {
        (StatusCode::NO_CONTENT, Body::empty())
    } else {
        let metrics = state.metrics.clone();
        let stream = ReaderStream::with_capacity(reader.take(length), BLOCK_SIZE).inspect(
            move |item| match item {
                Ok(bytes) => metrics.bytes_out.inc_by(bytes.len() as u64),
                Err(e) => {
                    tracing::warn!(chunk_id = %chunk_id, error = %e, "Chunk transfer interrupted");
                }
            },
        );
        (status, Body::from_stream(stream))
    };

    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = response_headers;
    Ok(response)
}
