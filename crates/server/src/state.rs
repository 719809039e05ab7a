//! Application state shared across handlers.

use crate::metrics::RawxMetrics;
use crate::notify::Notifier;
use rawx_core::config::AppConfig;
use rawx_storage::ChunkRepository;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Chunk repository.
    pub repository: Arc<dyn ChunkRepository>,
    /// Chunk event sink.
    pub notifier: Arc<dyn Notifier>,
    /// Prometheus metrics.
    pub metrics: Arc<RawxMetrics>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        config: AppConfig,
        repository: Arc<dyn ChunkRepository>,
        notifier: Arc<dyn Notifier>,
        metrics: RawxMetrics,
    ) -> Self {
        Self {
            config: Arc::new(config),
            repository,
            notifier,
            metrics: Arc::new(metrics),
        }
    }
}
