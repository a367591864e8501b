//! Cache Module
//!
//! Two-tier caching: a bounded in-memory layer with per-entry TTL over a
//! SQLite layer that survives restarts, plus the key builders and typed
//! facade used by the recipe services.

mod durable;
mod entry;
pub mod keys;
mod lru;
mod manager;
mod stats;
mod typed;
mod volatile;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use durable::{CacheEntry, DurableStore};
pub use entry::MemoryEntry;
pub use lru::LruTracker;
pub use manager::CacheManager;
pub use stats::{CacheStats, MemoryStats};
pub use typed::{ImageStatus, RecipeCache};
pub use volatile::{MemoryTable, VolatileStore};
