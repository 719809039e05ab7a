//! HTTP chunk server (rawx).
//!
//! This crate provides the data plane of a chunk storage node:
//! - Chunk upload with checksum verification and optional compression
//! - Whole and ranged chunk download
//! - Chunk existence checks, deletion and hard-link copies
//! - Chunk event notification
//! - Prometheus metrics

pub mod attrs;
pub mod compression;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod notify;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use metrics::RawxMetrics;
pub use notify::{ChunkEvent, Notifier};
pub use routes::create_router;
pub use state::AppState;
