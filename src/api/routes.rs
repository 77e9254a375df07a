//! API Routes
//!
//! Configures the Axum router with all content cache endpoints.

use axum::{
    routing::{delete, get, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    config_handler, content_handler, flush_handler, health_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /content/*path` - Serve content through the cache
/// - `GET /stats` - Get cache statistics
/// - `DELETE /cache` - Flush every cache entry
/// - `PUT /config` - Adjust cache bounds
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/content/*path", get(content_handler))
        .route("/stats", get(stats_handler))
        .route("/cache", delete(flush_handler))
        .route("/config", put(config_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
