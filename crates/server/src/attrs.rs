//! Bridges chunk metadata between HTTP headers and stored attributes.

use crate::error::{ApiError, ApiResult};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use rawx_core::metadata::full_path_attr;
use rawx_core::{ChunkId, ChunkMetadata};
use rawx_storage::{ChunkReader, ChunkWriter};
use std::collections::HashMap;

/// Read a header as text.
///
/// Absent headers are `None`; values that are not visible ASCII are
/// rejected.
pub fn header_str<'a>(headers: &'a HeaderMap, name: &'static str) -> ApiResult<Option<&'a str>> {
    match headers.get(name) {
        None => Ok(None),
        Some(value) => value.to_str().map(Some).map_err(|_| {
            ApiError::Core(rawx_core::Error::invalid_header(name, "not valid ASCII"))
        }),
    }
}

/// Collect the headers a metadata parser may ask for, with text validation
/// done up front so the parser can take a plain lookup closure.
fn text_headers(headers: &HeaderMap) -> ApiResult<HashMap<String, &str>> {
    let mut out = HashMap::with_capacity(headers.len());
    for (name, value) in headers {
        if !name.as_str().starts_with("x-oio-") {
            continue;
        }
        let text = value.to_str().map_err(|_| {
            ApiError::Core(rawx_core::Error::InvalidHeader {
                name: "X-oio-Chunk-Meta",
                reason: format!("{name} is not valid ASCII"),
            })
        })?;
        out.entry(name.as_str().to_string()).or_insert(text);
    }
    Ok(out)
}

/// HTTP and storage conversions for [`ChunkMetadata`].
pub trait ChunkMetadataExt: Sized {
    /// Build a candidate record from request headers.
    fn from_request_headers(chunk_id: ChunkId, headers: &HeaderMap) -> ApiResult<Self>;

    /// Overlay hash and size values sent as request trailers.
    fn apply_request_trailers(&mut self, trailers: &HeaderMap) -> ApiResult<()>;

    /// Queue every attribute of this record on `writer`.
    fn save_to(&self, writer: &mut dyn ChunkWriter);

    /// Load the record of `chunk_id` from an open chunk.
    fn load_from(chunk_id: ChunkId, reader: &dyn ChunkReader) -> Self;

    /// Append this record's response headers.
    fn fill_headers(&self, headers: &mut HeaderMap);
}

impl ChunkMetadataExt for ChunkMetadata {
    fn from_request_headers(chunk_id: ChunkId, headers: &HeaderMap) -> ApiResult<Self> {
        let text = text_headers(headers)?;
        let lookup = |name: &'static str| text.get(&name.to_ascii_lowercase()).copied();
        Ok(ChunkMetadata::from_headers(chunk_id, lookup)?)
    }

    fn apply_request_trailers(&mut self, trailers: &HeaderMap) -> ApiResult<()> {
        let text = text_headers(trailers)?;
        let lookup = |name: &'static str| text.get(&name.to_ascii_lowercase()).copied();
        Ok(self.apply_trailers(lookup)?)
    }

    fn save_to(&self, writer: &mut dyn ChunkWriter) {
        for (name, value) in self.to_attributes() {
            writer.set_attr(&name, &value);
        }
    }

    fn load_from(chunk_id: ChunkId, reader: &dyn ChunkReader) -> Self {
        ChunkMetadata::from_attributes(chunk_id, reader.attributes())
    }

    fn fill_headers(&self, headers: &mut HeaderMap) {
        for (name, value) in self.header_pairs() {
            let Ok(name) = HeaderName::from_bytes(name.as_bytes()) else {
                continue;
            };
            match HeaderValue::from_str(&value) {
                Ok(value) => {
                    headers.insert(name, value);
                }
                Err(_) => {
                    tracing::warn!(header = %name, "Skipping stored attribute that is not a valid header value");
                }
            }
        }
    }
}

/// Record the provenance of a linked chunk under its own ID.
pub fn save_full_path_to(target: &ChunkId, full_path: &str, writer: &mut dyn ChunkWriter) {
    writer.set_attr(&full_path_attr(target), full_path);
}
