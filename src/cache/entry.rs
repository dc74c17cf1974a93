//! Cache Entry Module
//!
//! Defines ledger entries and the materialized response shared between
//! the store, the in-flight registry and every waiter.

use std::time::{SystemTime, UNIX_EPOCH};

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

// == Cache Entry ==
/// One stored object as tracked by the eviction ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Canonical request identity
    pub key: String,
    /// Size of the materialized body
    pub size_bytes: u64,
    /// Insertion timestamp (Unix milliseconds, strictly increasing per ledger)
    pub inserted_at: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a ledger entry stamped `inserted_at`.
    pub fn new(key: impl Into<String>, size_bytes: u64, inserted_at: u64) -> Self {
        Self {
            key: key.into(),
            size_bytes,
            inserted_at,
        }
    }
}

// == Media Response ==
/// An upstream response with its body fully materialized.
///
/// Cloning shares the body buffer, so every clone is an independently
/// consumable copy without re-reading the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaResponse {
    /// Final upstream URL
    pub url: String,
    /// HTTP status code
    pub status: u16,
    /// `Content-Type` header, if the upstream sent one
    pub content_type: Option<String>,
    /// Remaining end-to-end upstream headers
    pub headers: HeaderMap,
    /// Response body
    pub body: Bytes,
}

impl MediaResponse {
    pub fn new(
        url: impl Into<String>,
        status: u16,
        content_type: Option<String>,
        body: impl Into<Bytes>,
    ) -> Self {
        Self {
            url: url.into(),
            status,
            content_type,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body length in bytes.
    pub fn size_bytes(&self) -> u64 {
        self.body.len() as u64
    }

    /// Content type, or the empty string when absent.
    pub fn content_type_or_empty(&self) -> &str {
        self.content_type.as_deref().unwrap_or_default()
    }

    /// Header metadata persisted next to a stored body.
    pub fn metadata(&self) -> ResponseMetadata {
        ResponseMetadata {
            url: self.url.clone(),
            status: self.status,
            content_type: self.content_type.clone(),
            headers: self
                .headers
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|value| (name.as_str().to_string(), value.to_string()))
                })
                .collect(),
        }
    }

    /// Rebuilds a response from persisted metadata and body.
    ///
    /// Header pairs that no longer parse are skipped.
    pub fn from_parts(metadata: ResponseMetadata, body: impl Into<Bytes>) -> Self {
        let headers = metadata
            .headers
            .iter()
            .filter_map(|(name, value)| {
                let name = HeaderName::from_bytes(name.as_bytes()).ok()?;
                let value = HeaderValue::from_str(value).ok()?;
                Some((name, value))
            })
            .collect();
        Self::new(metadata.url, metadata.status, metadata.content_type, body).with_headers(headers)
    }
}

/// Everything about a stored response except its body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub url: String,
    pub status: u16,
    #[serde(default)]
    pub content_type: Option<String>,
    /// Header name/value pairs in upstream order
    #[serde(default)]
    pub headers: Vec<(String, String)>,
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_success_range() {
        let ok = MediaResponse::new("u", 200, None, Bytes::new());
        let partial = MediaResponse::new("u", 206, None, Bytes::new());
        let missing = MediaResponse::new("u", 404, None, Bytes::new());
        assert!(ok.is_success());
        assert!(partial.is_success());
        assert!(!missing.is_success());
    }

    #[test]
    fn test_response_clone_shares_body() {
        let response = MediaResponse::new("u", 200, None, vec![1u8, 2, 3]);
        let copy = response.clone();
        assert_eq!(copy.body, response.body);
        assert_eq!(copy.size_bytes(), 3);
    }

    #[test]
    fn test_missing_content_type_is_empty() {
        let response = MediaResponse::new("u", 200, None, Bytes::new());
        assert_eq!(response.content_type_or_empty(), "");
    }

    #[test]
    fn test_metadata_roundtrip_keeps_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("cache-control", HeaderValue::from_static("max-age=3600"));
        headers.append("x-served-by", HeaderValue::from_static("edge-1"));
        headers.append("x-served-by", HeaderValue::from_static("edge-2"));
        let response = MediaResponse::new(
            "https://cdn.example/seg.m4s",
            200,
            Some("video/mp4".to_string()),
            vec![0u8; 4],
        )
        .with_headers(headers);

        let rebuilt = MediaResponse::from_parts(response.metadata(), response.body.clone());
        assert_eq!(rebuilt, response);
        assert_eq!(rebuilt.headers.get_all("x-served-by").iter().count(), 2);
    }

    #[test]
    fn test_metadata_without_headers_still_parses() {
        let json = r#"{"url":"https://cdn.example/a.m4s","status":200,"content_type":"video/mp4"}"#;
        let metadata: ResponseMetadata = serde_json::from_str(json).unwrap();
        let rebuilt = MediaResponse::from_parts(metadata, Bytes::new());
        assert!(rebuilt.headers.is_empty());
    }

    #[test]
    fn test_unparseable_persisted_header_skipped() {
        let metadata = ResponseMetadata {
            url: "u".to_string(),
            status: 200,
            content_type: None,
            headers: vec![
                ("bad name".to_string(), "x".to_string()),
                ("etag".to_string(), "\"v1\"".to_string()),
            ],
        };
        let rebuilt = MediaResponse::from_parts(metadata, Bytes::new());
        assert_eq!(rebuilt.headers.len(), 1);
        assert_eq!(rebuilt.headers["etag"], "\"v1\"");
    }
}
