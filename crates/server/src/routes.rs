//! Route configuration.

use crate::handlers;
use crate::metrics::metrics_handler;
use crate::state::AppState;
use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new();

    // When enabled, this endpoint should be reachable only by the scraper.
    // Other methods on the path are chunk requests like any other.
    if state.config.server.metrics_enabled {
        router = router.route(
            "/metrics",
            get(metrics_handler).fallback(handlers::chunk_fallback),
        );
    }

    // Chunk paths use a fallback handler: COPY is not a method axum can route.
    router
        .fallback(handlers::chunk_fallback)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
