//! API Module
//!
//! HTTP handlers and routing for the cache's operational surface.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /system/cache-stats` - Two-tier cache statistics
//! - `DELETE /cache/:key` - Invalidate a key

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
