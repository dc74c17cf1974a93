//! Error types for the media cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the proxy's HTTP surface.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Invalid request data (missing or malformed upstream URL)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Upstream fetch failed
    #[error("Upstream fetch failed: {0}")]
    Upstream(#[from] FetchError),

    /// Configuration rejected at startup
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == Fetch Error Enum ==
/// Failure of a single upstream fetch.
///
/// Cloneable so that one outcome can be handed to every waiter attached to
/// the same in-flight request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The transport could not complete the request
    #[error("{url}: {message}")]
    Request { url: String, message: String },

    /// The task owning the fetch went away without publishing an outcome
    #[error("fetch for {0} was abandoned before completing")]
    Abandoned(String),
}

impl FetchError {
    pub fn request(url: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Request {
            url: url.into(),
            message: err.to_string(),
        }
    }
}

// == Store Error Enum ==
/// Blob store failure. Logged by the caller, never surfaced to clients.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("blob store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("blob metadata error: {0}")]
    Metadata(#[from] serde_json::Error),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Upstream(_) => StatusCode::BAD_GATEWAY,
            CacheError::InvalidConfig(_) | CacheError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the media cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_request_maps_to_bad_request() {
        let response = CacheError::InvalidRequest("missing url".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_upstream_maps_to_bad_gateway() {
        let err = FetchError::request("https://cdn.example/a.m4s", "connection reset");
        let response = CacheError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_fetch_error_display_includes_url() {
        let err = FetchError::request("https://cdn.example/a.m4s", "timed out");
        assert_eq!(err.to_string(), "https://cdn.example/a.m4s: timed out");
    }
}
