//! Season Cache - two-tier cache for the seasonal recipe services
//!
//! A bounded in-memory layer with per-entry TTL in front of a SQLite layer
//! that survives restarts, with warm-up, periodic cleanup and typed accessors.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
mod tasks;

pub use api::AppState;
pub use cache::{CacheManager, CacheStats, RecipeCache};
pub use config::{CacheConfig, Config};
pub use error::{CacheError, Result};
