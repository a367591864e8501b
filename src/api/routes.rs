//! API Routes
//!
//! Configures the Axum router with the cache's operational endpoints.

use axum::{
    routing::{delete, get},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{cache_stats_handler, delete_handler, health_handler, AppState};

/// Creates the router.
///
/// # Endpoints
/// - `GET /health` - Health check
/// - `GET /system/cache-stats` - Counts and TTLs of both cache layers
/// - `DELETE /cache/:key` - Invalidate one key in both layers
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/system/cache-stats", get(cache_stats_handler))
        .route("/cache/:key", delete(delete_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
