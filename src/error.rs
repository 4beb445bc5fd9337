//! Error types for the caching relay
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Worker Error Enum ==
/// Unified error type for the caching relay.
///
/// A cache miss is not an error and is represented as `Option::None` by the
/// cache layer. Cache-write failures are logged where they occur and never
/// surfaced to callers of `put`; the variant exists for the internal envelope
/// path and the `add` combinator.
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Request does not use an HTTP scheme
    #[error("Not a HTTP request: {0}")]
    NonHttpRequest(String),

    /// Network fetch failed (transport error; HTTP error statuses are
    /// responses, not errors)
    #[error("Network request failed: {0}")]
    Network(String),

    /// Network fetch exceeded the configured deadline
    #[error("Network timed out after {0} seconds")]
    Timeout(u64),

    /// Writing an entry to a cache failed
    #[error("Cache write failed: {0}")]
    CacheWrite(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for WorkerError {
    fn into_response(self) -> Response {
        let status = match &self {
            WorkerError::NonHttpRequest(_) => StatusCode::FORBIDDEN,
            WorkerError::Network(_) => StatusCode::BAD_GATEWAY,
            WorkerError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            WorkerError::CacheWrite(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the caching relay.
pub type Result<T> = std::result::Result<T, WorkerError>;
