//! Chunk request handlers.
//!
//! Every chunk path reaches [`chunk_fallback`], which validates the chunk
//! ID once, picks the pipeline from the method and records the outcome.

mod check;
mod copy;
mod delete;
mod download;
mod upload;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::Method;
use axum::response::Response;
use rawx_core::ChunkId;
use std::time::Instant;

/// Pipeline selected by the request method.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkOperation {
    Upload,
    Copy,
    Check,
    Download,
    Delete,
}

impl ChunkOperation {
    /// Map a request method onto a pipeline.
    pub fn from_method(method: &Method) -> Option<Self> {
        match method.as_str() {
            "PUT" => Some(Self::Upload),
            "COPY" => Some(Self::Copy),
            "HEAD" => Some(Self::Check),
            "GET" => Some(Self::Download),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }

    /// Label used in logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Upload => "put",
            Self::Copy => "copy",
            Self::Check => "head",
            Self::Download => "get",
            Self::Delete => "delete",
        }
    }
}

/// Entry point for every request not claimed by another route.
pub async fn chunk_fallback(State(state): State<AppState>, req: Request) -> Response {
    let started = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let operation = ChunkOperation::from_method(&method);

    let response = match serve_chunk(&state, operation, req).await {
        Ok(response) => response,
        Err(e) => {
            let status = e.status_code();
            if status.is_server_error() {
                tracing::error!(%method, %path, status = status.as_u16(), error = %e, "Chunk request failed");
            } else {
                tracing::warn!(%method, %path, status = status.as_u16(), error = %e, "Chunk request rejected");
            }
            e.into_response_for(&method)
        }
    };

    let label = operation.map_or("other", ChunkOperation::as_str);
    state
        .metrics
        .observe_request(label, response.status(), started.elapsed());
    response
}

async fn serve_chunk(
    state: &AppState,
    operation: Option<ChunkOperation>,
    req: Request,
) -> ApiResult<Response> {
    let chunk_id = ChunkId::from_path(req.uri().path())?;
    let Some(operation) = operation else {
        return Err(ApiError::MethodNotAllowed(req.method().to_string()));
    };

    let (parts, body) = req.into_parts();
    match operation {
        ChunkOperation::Upload => upload::upload_chunk(state, chunk_id, &parts.headers, body).await,
        ChunkOperation::Copy => copy::copy_chunk(state, chunk_id, &parts.headers).await,
        ChunkOperation::Check => check::check_chunk(state, chunk_id).await,
        ChunkOperation::Download => download::download_chunk(state, chunk_id, &parts.headers).await,
        ChunkOperation::Delete => delete::delete_chunk(state, chunk_id).await,
    }
}
