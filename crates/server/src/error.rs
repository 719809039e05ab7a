//! API error types.

use axum::Json;
use axum::body::Body;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use rawx_storage::StorageError;
use serde::Serialize;

/// Header carrying the error message on every error reply.
pub const X_ERROR: &str = "x-error";

/// API error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] rawx_core::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("range not satisfiable: offset {offset} beyond chunk of {size} bytes")]
    RangeNotSatisfiable { offset: u64, size: u64 },

    #[error("compression mode not managed: {0}")]
    CompressionNotManaged(String),

    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    #[error("method not allowed: {0}")]
    MethodNotAllowed(String),

    #[error("failed to read request body: {0}")]
    BodyRead(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Get the error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Core(e) => match e {
                rawx_core::Error::InvalidChunkId(_) => "invalid_chunk_id",
                rawx_core::Error::MissingHeader(_) => "missing_header",
                rawx_core::Error::InvalidHeader { .. } => "invalid_header",
                rawx_core::Error::InvalidRange(_) => "invalid_range",
                rawx_core::Error::HashMismatch { .. } => "hash_mismatch",
                rawx_core::Error::SizeMismatch { .. } => "size_mismatch",
            },
            Self::Storage(e) => match e {
                StorageError::NotFound(_) => "not_found",
                StorageError::AlreadyExists(_) => "chunk_exists",
                StorageError::InvalidAttributes { .. } => "invalid_attributes",
                StorageError::Unsupported(_) => "unsupported",
                StorageError::Io(_) | StorageError::Config(_) => "storage_error",
            },
            Self::RangeNotSatisfiable { .. } => "range_not_satisfiable",
            Self::CompressionNotManaged(_) => "compression_not_managed",
            Self::NotImplemented(_) => "not_implemented",
            Self::MethodNotAllowed(_) => "method_not_allowed",
            Self::BodyRead(_) => "body_read_error",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Core(e) => match e {
                rawx_core::Error::HashMismatch { .. } | rawx_core::Error::SizeMismatch { .. } => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                _ => StatusCode::BAD_REQUEST,
            },
            Self::Storage(e) => match e {
                StorageError::NotFound(_) => StatusCode::NOT_FOUND,
                StorageError::AlreadyExists(_) => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::RangeNotSatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
            Self::CompressionNotManaged(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::BodyRead(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();
        let x_error = HeaderValue::from_str(&message)
            .unwrap_or_else(|_| HeaderValue::from_static("unprintable error"));
        let body = ErrorResponse {
            code: self.code().to_string(),
            message,
        };
        (status, [(X_ERROR, x_error)], Json(body)).into_response()
    }
}

impl ApiError {
    /// Render the error for a request made with `method`.
    ///
    /// HEAD replies keep the status and `X-Error` header but carry no body.
    pub fn into_response_for(self, method: &Method) -> Response {
        let mut response = self.into_response();
        if method == Method::HEAD {
            *response.body_mut() = Body::empty();
            response.headers_mut().remove(header::CONTENT_TYPE);
        }
        response
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
