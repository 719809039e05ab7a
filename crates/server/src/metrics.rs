//! Prometheus metrics for the rawx server.
//!
//! Every metric lives in a registry owned by [`RawxMetrics`], which handlers
//! reach through `AppState`.

use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;

/// Request and transfer metrics of one server instance.
pub struct RawxMetrics {
    registry: Registry,
    /// Requests by operation and status code.
    pub requests: IntCounterVec,
    /// Request latency by operation.
    pub request_duration: HistogramVec,
    /// Chunk bytes received from clients, before compression.
    pub bytes_in: IntCounter,
    /// Chunk bytes sent to clients.
    pub bytes_out: IntCounter,
    /// Uploads rejected because the declared hash or size did not match.
    pub checksum_mismatches: IntCounter,
    /// Chunk events that could not be delivered.
    pub notify_failures: IntCounter,
}

impl RawxMetrics {
    /// Create the metrics and register them in a fresh registry.
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let requests = IntCounterVec::new(
            Opts::new("rawx_requests_total", "Total chunk requests by operation and status"),
            &["operation", "status"],
        )?;
        let request_duration = HistogramVec::new(
            HistogramOpts::new(
                "rawx_request_duration_seconds",
                "Time taken to serve a chunk request",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
            &["operation"],
        )?;
        let bytes_in = IntCounter::new("rawx_bytes_in_total", "Total chunk bytes received")?;
        let bytes_out = IntCounter::new("rawx_bytes_out_total", "Total chunk bytes sent")?;
        let checksum_mismatches = IntCounter::new(
            "rawx_checksum_mismatches_total",
            "Total uploads rejected on checksum mismatch",
        )?;
        let notify_failures = IntCounter::new(
            "rawx_notify_failures_total",
            "Total chunk event notifications that failed",
        )?;

        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(request_duration.clone()))?;
        registry.register(Box::new(bytes_in.clone()))?;
        registry.register(Box::new(bytes_out.clone()))?;
        registry.register(Box::new(checksum_mismatches.clone()))?;
        registry.register(Box::new(notify_failures.clone()))?;

        Ok(Self {
            registry,
            requests,
            request_duration,
            bytes_in,
            bytes_out,
            checksum_mismatches,
            notify_failures,
        })
    }

    /// Record one served request.
    pub fn observe_request(&self, operation: &str, status: StatusCode, elapsed: Duration) {
        self.requests
            .with_label_values(&[operation, status.as_str()])
            .inc();
        self.request_duration
            .with_label_values(&[operation])
            .observe(elapsed.as_secs_f64());
    }

    /// Encode all metrics in the Prometheus text format.
    pub fn encode(&self) -> prometheus::Result<Vec<u8>> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(buffer)
    }
}

/// GET /metrics - Prometheus metrics endpoint.
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(buffer) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {e}").into_bytes(),
        ),
    }
}
