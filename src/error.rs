//! Error types for the cache subsystem
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the cache subsystem.
///
/// Misses are never errors: lookups return `Option`. Only durable I/O,
/// serialization, configuration and lifecycle failures end up here.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The manager (or the durable handle) has already been closed
    #[error("cache is closed")]
    Closed,

    /// SQLite failure in the durable layer
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// A value could not be encoded as JSON
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem failure while preparing the durable store
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Rejected configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::Closed => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
            CacheError::Storage(_)
            | CacheError::Serialization(_)
            | CacheError::Io(_)
            | CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache subsystem.
pub type Result<T> = std::result::Result<T, CacheError>;
