//! Core domain types and shared logic for the rawx chunk server.
//!
//! This crate defines the data model used across the other crates:
//! - Chunk identifiers and their canonical form
//! - Chunk metadata and the header/attribute field table
//! - Declared upload lengths and byte ranges
//! - MD5 chunk checksums
//! - Service configuration

pub mod chunk;
pub mod config;
pub mod error;
pub mod hash;
pub mod metadata;
pub mod range;
pub mod upload;

pub use chunk::ChunkId;
pub use error::{Error, Result};
pub use hash::ChunkHasher;
pub use metadata::{ChunkField, ChunkMetadata, FieldKind};
pub use range::RangeSpec;
pub use upload::ContentLength;

/// Block size used when streaming chunk bytes in either direction: 1 MiB.
pub const BLOCK_SIZE: usize = 1024 * 1024;

/// Length of a chunk identifier in hexadecimal characters.
pub const CHUNK_ID_LEN: usize = 64;
