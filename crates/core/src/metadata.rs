//! Chunk metadata: the request header set and its persisted attribute form.

use crate::chunk::ChunkId;
use crate::hash::verify_digest;
use std::collections::BTreeMap;

/// Attribute holding the compression tag of a stored chunk.
pub const ATTR_COMPRESSION: &str = "user.grid.compression";
/// Compression tag written for zlib-deflated chunks.
pub const COMPRESSION_ZLIB: &str = "zlib";

/// Header carrying the chunk identifier of the request.
pub const HEADER_CHUNK_ID: &str = "X-oio-Chunk-Meta-Chunk-Id";
/// Attribute holding the canonical chunk identifier.
pub const ATTR_CHUNK_ID: &str = "user.grid.chunk.id";
/// Header carrying the opaque full-path provenance string.
pub const HEADER_FULL_PATH: &str = "X-oio-Chunk-Meta-Full-Path";

const ATTR_FULL_PATH_PREFIX: &str = "user.oio:";

/// Attribute name under which the full path of `id` is stored.
///
/// The name is keyed by chunk ID so that hard links sharing the same bytes
/// each keep their own provenance.
pub fn full_path_attr(id: &ChunkId) -> String {
    format!("{ATTR_FULL_PATH_PREFIX}{id}")
}

/// Shape a field value must have.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// Any non-empty string.
    Text,
    /// A non-negative decimal integer.
    Integer,
    /// A non-empty hexadecimal string.
    Hex,
    /// A chunk position, `N` or `N.M`.
    Position,
}

impl FieldKind {
    fn check(self, value: &str) -> Result<(), &'static str> {
        let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
        let ok = match self {
            FieldKind::Text => !value.is_empty(),
            FieldKind::Integer => digits(value) && value.parse::<u64>().is_ok(),
            FieldKind::Hex => !value.is_empty() && value.bytes().all(|b| b.is_ascii_hexdigit()),
            FieldKind::Position => match value.split_once('.') {
                Some((major, minor)) => digits(major) && digits(minor),
                None => digits(value),
            },
        };
        if ok {
            Ok(())
        } else {
            Err(match self {
                FieldKind::Text => "empty value",
                FieldKind::Integer => "expected a non-negative integer",
                FieldKind::Hex => "expected a hexadecimal string",
                FieldKind::Position => "expected a position like 3 or 3.1",
            })
        }
    }
}

/// Metadata fields exchanged as `X-oio-Chunk-Meta-*` headers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChunkField {
    ContainerId,
    ContentPath,
    ContentVersion,
    ContentId,
    StoragePolicy,
    ChunkMethod,
    MimeType,
    ChunkPosition,
    ChunkSize,
    ChunkHash,
    MetachunkSize,
    MetachunkHash,
    OioVersion,
}

impl ChunkField {
    pub const ALL: [ChunkField; 13] = [
        ChunkField::ContainerId,
        ChunkField::ContentPath,
        ChunkField::ContentVersion,
        ChunkField::ContentId,
        ChunkField::StoragePolicy,
        ChunkField::ChunkMethod,
        ChunkField::MimeType,
        ChunkField::ChunkPosition,
        ChunkField::ChunkSize,
        ChunkField::ChunkHash,
        ChunkField::MetachunkSize,
        ChunkField::MetachunkHash,
        ChunkField::OioVersion,
    ];

    /// Request and response header name.
    pub fn header_name(self) -> &'static str {
        match self {
            ChunkField::ContainerId => "X-oio-Chunk-Meta-Container-Id",
            ChunkField::ContentPath => "X-oio-Chunk-Meta-Content-Path",
            ChunkField::ContentVersion => "X-oio-Chunk-Meta-Content-Version",
            ChunkField::ContentId => "X-oio-Chunk-Meta-Content-Id",
            ChunkField::StoragePolicy => "X-oio-Chunk-Meta-Content-Storage-Policy",
            ChunkField::ChunkMethod => "X-oio-Chunk-Meta-Content-Chunk-Method",
            ChunkField::MimeType => "X-oio-Chunk-Meta-Content-Mime-Type",
            ChunkField::ChunkPosition => "X-oio-Chunk-Meta-Chunk-Pos",
            ChunkField::ChunkSize => "X-oio-Chunk-Meta-Chunk-Size",
            ChunkField::ChunkHash => "X-oio-Chunk-Meta-Chunk-Hash",
            ChunkField::MetachunkSize => "X-oio-Chunk-Meta-Metachunk-Size",
            ChunkField::MetachunkHash => "X-oio-Chunk-Meta-Metachunk-Hash",
            ChunkField::OioVersion => "X-oio-Chunk-Meta-Oio-Version",
        }
    }

    /// Persisted attribute name.
    pub fn attr_name(self) -> &'static str {
        match self {
            ChunkField::ContainerId => "user.grid.content.container",
            ChunkField::ContentPath => "user.grid.content.path",
            ChunkField::ContentVersion => "user.grid.content.version",
            ChunkField::ContentId => "user.grid.content.id",
            ChunkField::StoragePolicy => "user.grid.content.storage_policy",
            ChunkField::ChunkMethod => "user.grid.content.chunk_method",
            ChunkField::MimeType => "user.grid.content.mime_type",
            ChunkField::ChunkPosition => "user.grid.chunk.position",
            ChunkField::ChunkSize => "user.grid.chunk.size",
            ChunkField::ChunkHash => "user.grid.chunk.hash",
            ChunkField::MetachunkSize => "user.grid.metachunk.size",
            ChunkField::MetachunkHash => "user.grid.metachunk.hash",
            ChunkField::OioVersion => "user.grid.oio.version",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            ChunkField::ContentVersion
            | ChunkField::ChunkSize
            | ChunkField::MetachunkSize => FieldKind::Integer,
            ChunkField::ContentId | ChunkField::ChunkHash | ChunkField::MetachunkHash => {
                FieldKind::Hex
            }
            ChunkField::ChunkPosition => FieldKind::Position,
            _ => FieldKind::Text,
        }
    }

    /// Whether a PUT must carry this header.
    pub fn mandatory(self) -> bool {
        !matches!(
            self,
            ChunkField::MimeType
                | ChunkField::ChunkSize
                | ChunkField::ChunkHash
                | ChunkField::MetachunkSize
                | ChunkField::MetachunkHash
                | ChunkField::OioVersion
        )
    }

    /// Validate a raw value against this field's kind.
    pub fn validate(self, value: &str) -> crate::Result<()> {
        self.kind()
            .check(value)
            .map_err(|reason| crate::Error::invalid_header(self.header_name(), reason))
    }
}

/// Metadata record of one chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkMetadata {
    chunk_id: ChunkId,
    fields: BTreeMap<ChunkField, String>,
    full_path: Option<String>,
    compression: Option<String>,
}

impl ChunkMetadata {
    /// Empty record for `chunk_id`.
    pub fn new(chunk_id: ChunkId) -> Self {
        Self {
            chunk_id,
            fields: BTreeMap::new(),
            full_path: None,
            compression: None,
        }
    }

    /// Build a candidate record from request headers.
    ///
    /// `header` returns the value of a header by name, or `None` when the
    /// header is absent. Mandatory fields must be present and every present
    /// field must match its kind. A chunk ID header, when given, must name
    /// the same chunk as `chunk_id`.
    pub fn from_headers<'a, F>(chunk_id: ChunkId, header: F) -> crate::Result<Self>
    where
        F: Fn(&'static str) -> Option<&'a str>,
    {
        if let Some(claimed) = header(HEADER_CHUNK_ID)
            && !claimed.trim().eq_ignore_ascii_case(chunk_id.as_str())
        {
            return Err(crate::Error::invalid_header(
                HEADER_CHUNK_ID,
                "does not match the chunk ID of the request path",
            ));
        }

        let mut meta = Self::new(chunk_id);
        for field in ChunkField::ALL {
            match header(field.header_name()) {
                Some(value) => meta.set(field, value.trim())?,
                None if field.mandatory() => {
                    return Err(crate::Error::MissingHeader(field.header_name()));
                }
                None => {}
            }
        }
        if let Some(full_path) = header(HEADER_FULL_PATH) {
            meta.full_path = Some(full_path.trim().to_string());
        }
        Ok(meta)
    }

    /// Overlay values announced in request trailers.
    ///
    /// Only the chunk hash and chunk size are meaningful after the body;
    /// trailer values replace whatever the headers declared.
    pub fn apply_trailers<'a, F>(&mut self, trailer: F) -> crate::Result<()>
    where
        F: Fn(&'static str) -> Option<&'a str>,
    {
        for field in [ChunkField::ChunkHash, ChunkField::ChunkSize] {
            if let Some(value) = trailer(field.header_name()) {
                self.set(field, value.trim())?;
            }
        }
        Ok(())
    }

    /// Check the declared hash and size against what was actually received,
    /// then record the computed values.
    pub fn seal(&mut self, computed_hash: &str, bytes_read: u64) -> crate::Result<()> {
        if let Some(declared) = self.get(ChunkField::ChunkHash) {
            verify_digest(declared, computed_hash)?;
        }
        if let Some(declared) = self.get(ChunkField::ChunkSize) {
            let declared: u64 = declared.parse().map_err(|_| {
                crate::Error::invalid_header(ChunkField::ChunkSize.header_name(), "not an integer")
            })?;
            if declared != bytes_read {
                return Err(crate::Error::SizeMismatch {
                    declared,
                    actual: bytes_read,
                });
            }
        }
        self.fields
            .insert(ChunkField::ChunkHash, computed_hash.to_ascii_uppercase());
        self.fields
            .insert(ChunkField::ChunkSize, bytes_read.to_string());
        Ok(())
    }

    /// Load a record from persisted attributes, verbatim.
    ///
    /// Unknown attributes are ignored; values are not re-validated.
    pub fn from_attributes(chunk_id: ChunkId, attrs: &BTreeMap<String, String>) -> Self {
        let mut meta = Self::new(chunk_id);
        for field in ChunkField::ALL {
            if let Some(value) = attrs.get(field.attr_name()) {
                meta.fields.insert(field, value.clone());
            }
        }
        meta.full_path = attrs.get(&full_path_attr(&meta.chunk_id)).cloned();
        meta.compression = attrs.get(ATTR_COMPRESSION).cloned();
        meta
    }

    /// Attribute pairs to persist for this record.
    pub fn to_attributes(&self) -> Vec<(String, String)> {
        let mut attrs = vec![(ATTR_CHUNK_ID.to_string(), self.chunk_id.to_string())];
        attrs.extend(
            self.fields
                .iter()
                .map(|(field, value)| (field.attr_name().to_string(), value.clone())),
        );
        if let Some(compression) = &self.compression {
            attrs.push((ATTR_COMPRESSION.to_string(), compression.clone()));
        }
        if let Some(full_path) = &self.full_path {
            attrs.push((full_path_attr(&self.chunk_id), full_path.clone()));
        }
        attrs
    }

    /// Header pairs describing this record in a response.
    pub fn header_pairs(&self) -> Vec<(&'static str, String)> {
        let mut headers = vec![(HEADER_CHUNK_ID, self.chunk_id.to_string())];
        headers.extend(
            self.fields
                .iter()
                .map(|(field, value)| (field.header_name(), value.clone())),
        );
        if let Some(full_path) = &self.full_path {
            headers.push((HEADER_FULL_PATH, full_path.clone()));
        }
        headers
    }

    /// Set a field after validating it.
    pub fn set(&mut self, field: ChunkField, value: &str) -> crate::Result<()> {
        field.validate(value)?;
        self.fields.insert(field, value.to_string());
        Ok(())
    }

    pub fn get(&self, field: ChunkField) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    pub fn chunk_id(&self) -> &ChunkId {
        &self.chunk_id
    }

    pub fn chunk_hash(&self) -> Option<&str> {
        self.get(ChunkField::ChunkHash)
    }

    pub fn chunk_size(&self) -> Option<u64> {
        self.get(ChunkField::ChunkSize).and_then(|v| v.parse().ok())
    }

    pub fn full_path(&self) -> Option<&str> {
        self.full_path.as_deref()
    }

    pub fn set_full_path(&mut self, full_path: impl Into<String>) {
        self.full_path = Some(full_path.into());
    }

    pub fn compression(&self) -> Option<&str> {
        self.compression.as_deref()
    }

    pub fn set_compression(&mut self, tag: Option<&str>) {
        self.compression = tag.map(str::to_string);
    }
}
