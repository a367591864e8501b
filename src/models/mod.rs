//! Response models for the cache's HTTP surface
//!
//! Stats are served straight from [`crate::cache::CacheStats`]; the DTOs here
//! cover the remaining endpoints and error bodies.

pub mod responses;

pub use responses::{DeleteResponse, ErrorResponse, HealthResponse};
