//! COPY: alias an existing chunk under a new ID.

use crate::attrs::{header_str, save_full_path_to};
use crate::error::ApiResult;
use crate::state::AppState;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use rawx_core::metadata::HEADER_FULL_PATH;
use rawx_core::{ChunkId, Error};

const DESTINATION: &str = "Destination";

#[tracing::instrument(skip_all, fields(chunk_id = %source))]
pub(super) async fn copy_chunk(
    state: &AppState,
    source: ChunkId,
    headers: &HeaderMap,
) -> ApiResult<Response> {
    let destination = header_str(headers, DESTINATION)?.ok_or(Error::MissingHeader(DESTINATION))?;
    let full_path =
        header_str(headers, HEADER_FULL_PATH)?.ok_or(Error::MissingHeader(HEADER_FULL_PATH))?;
    let target = parse_destination(destination, state.config.server.service_url.as_deref())?;
    if target == source {
        return Err(Error::invalid_header(DESTINATION, "destination is the source chunk").into());
    }

    let mut writer = state.repository.link(&source, &target).await?;
    save_full_path_to(&target, full_path.trim(), writer.as_mut());
    writer.commit().await?;

    tracing::info!(destination = %target, "Chunk linked");
    Ok(StatusCode::CREATED.into_response())
}

/// Resolve the target chunk of a `Destination` header.
///
/// The value is an absolute URL or a bare path; its last segment names the
/// new chunk. When `service_url` is set, an absolute URL must point at it.
fn parse_destination(value: &str, service_url: Option<&str>) -> rawx_core::Result<ChunkId> {
    let uri: Uri = value
        .trim()
        .parse()
        .map_err(|_| Error::invalid_header(DESTINATION, "not a valid URL"))?;

    if let (Some(expected), Some(authority)) = (service_url, uri.authority()) {
        let expected = expected
            .split_once("://")
            .map_or(expected, |(_, rest)| rest)
            .trim_end_matches('/');
        if !authority.as_str().eq_ignore_ascii_case(expected) {
            return Err(Error::invalid_header(
                DESTINATION,
                format!("destination {authority} is not this service ({expected})"),
            ));
        }
    }

    ChunkId::from_path(uri.path()).map_err(|_| {
        Error::invalid_header(DESTINATION, "last path segment is not a chunk ID")
    })
}
