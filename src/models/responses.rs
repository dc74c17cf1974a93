//! Response DTOs for the proxy API
//!
//! Defines the structure of outgoing message and status bodies.

use serde::{Deserialize, Serialize};

use crate::cache::CacheStats;

/// Usage figures in the wire shape the status UI expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsPayload {
    /// Bytes currently accounted in the cache
    pub size: u64,
    /// Entries currently accounted in the cache
    pub count: u64,
    /// Cache hits since startup
    pub hits: u64,
}

impl From<CacheStats> for StatsPayload {
    fn from(stats: CacheStats) -> Self {
        Self {
            size: stats.total_bytes,
            count: stats.entry_count,
            hits: stats.hit_count,
        }
    }
}

/// Message returned over the message endpoint (`POST /messages`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WorkerMessage {
    /// Reply to `GET_CACHE_STATS`
    #[serde(rename = "CACHE_STATS")]
    CacheStats { stats: StatsPayload },
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cache_stats_message_shape() {
        let msg = WorkerMessage::CacheStats {
            stats: StatsPayload::from(CacheStats {
                total_bytes: 600,
                entry_count: 2,
                hit_count: 7,
            }),
        };

        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "CACHE_STATS",
                "stats": { "size": 600, "count": 2, "hits": 7 }
            })
        );
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }
}
