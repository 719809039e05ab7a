//! HEAD: report a chunk's size without reading it.

use crate::error::ApiResult;
use crate::state::AppState;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use rawx_core::ChunkId;

#[tracing::instrument(skip_all, fields(chunk_id = %chunk_id))]
pub(super) async fn check_chunk(state: &AppState, chunk_id: ChunkId) -> ApiResult<Response> {
    let reader = state.repository.get(&chunk_id).await?;
    let size = reader.size();
    drop(reader);

    Ok((
        StatusCode::NO_CONTENT,
        [
            (header::CONTENT_LENGTH, size.to_string()),
            (header::ACCEPT_RANGES, "bytes".to_string()),
        ],
    )
        .into_response())
}
