//! DELETE: remove a chunk and its attributes.

use crate::error::ApiResult;
use crate::state::AppState;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rawx_core::ChunkId;

#[tracing::instrument(skip_all, fields(chunk_id = %chunk_id))]
pub(super) async fn delete_chunk(state: &AppState, chunk_id: ChunkId) -> ApiResult<Response> {
    state.repository.delete(&chunk_id).await?;
    tracing::info!("Chunk deleted");
    Ok(StatusCode::NO_CONTENT.into_response())
}
