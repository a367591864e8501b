//! API Handlers
//!
//! HTTP handlers for the cache's operational endpoints. Manager calls may
//! block on SQLite, so they run on Tokio's blocking pool.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::cache::{CacheManager, CacheStats, RecipeCache};
use crate::error::{CacheError, Result};
use crate::models::{DeleteResponse, HealthResponse};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Two-tier cache, shared with the background cleanup routine
    pub cache: Arc<CacheManager>,
}

impl AppState {
    /// Creates a new AppState around an opened manager.
    pub fn new(cache: Arc<CacheManager>) -> Self {
        Self { cache }
    }

    /// Typed facade over the same manager, for domain services.
    pub fn recipes(&self) -> RecipeCache {
        RecipeCache::new(Arc::clone(&self.cache))
    }
}

async fn run_blocking<T, F>(cache: Arc<CacheManager>, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&CacheManager) -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&cache))
        .await
        .map_err(|err| CacheError::Internal(err.to_string()))?
}

/// Handler for GET /system/cache-stats
pub async fn cache_stats_handler(State(state): State<AppState>) -> Result<Json<CacheStats>> {
    let stats = run_blocking(state.cache, |cache| {
        if cache.is_closed() {
            return Err(CacheError::Closed);
        }
        Ok(cache.stats())
    })
    .await?;

    Ok(Json(stats))
}

/// Handler for DELETE /cache/:key
///
/// Invalidates the key in both layers; deleting an absent key succeeds.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let deleted = key.clone();
    run_blocking(state.cache, move |cache| cache.delete(&deleted)).await?;

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
