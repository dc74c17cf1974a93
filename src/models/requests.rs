//! Request DTOs for the proxy API
//!
//! Defines the structure of incoming query strings and message bodies.

use serde::{Deserialize, Serialize};
use url::Url;

/// Query string of the interception endpoint (`/media?url=...`)
#[derive(Debug, Clone, Deserialize)]
pub struct MediaQuery {
    /// Absolute upstream URL of the resource
    #[serde(default)]
    pub url: Option<String>,
}

impl MediaQuery {
    /// Parses the upstream URL, accepting only http and https.
    ///
    /// Returns an error message if validation fails.
    pub fn upstream_url(&self) -> Result<Url, String> {
        let raw = self
            .url
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .ok_or_else(|| "Missing 'url' query parameter".to_string())?;
        let url = Url::parse(raw)
            .map_err(|err| format!("Invalid upstream url '{}': {}", raw, err))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(format!("Unsupported upstream scheme '{}'", other)),
        }
    }
}

/// Message sent by a client over the message endpoint (`POST /messages`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Ask for a usage snapshot
    #[serde(rename = "GET_CACHE_STATS")]
    GetCacheStats,
}
