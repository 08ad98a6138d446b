//! Outgoing response bodies.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::cache::CacheStats;

/// Body of a `GET /get/:key` hit.
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    pub key: String,
    pub value: Value,
}

impl GetResponse {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Acknowledgement of a write or delete on a single key.
#[derive(Debug, Clone, Serialize)]
pub struct KeyResponse {
    pub message: String,
    pub key: String,
}

impl KeyResponse {
    pub fn stored(key: impl Into<String>) -> Self {
        Self::with_action(key.into(), "set")
    }

    pub fn deleted(key: impl Into<String>) -> Self {
        Self::with_action(key.into(), "deleted")
    }

    fn with_action(key: String, action: &str) -> Self {
        Self {
            message: format!("Key '{}' {} successfully", key, action),
            key,
        }
    }
}

/// Body of `DELETE /clear`.
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub message: String,
    /// Entries present before the clear
    pub removed: usize,
}

impl ClearResponse {
    pub fn new(removed: usize) -> Self {
        Self {
            message: format!("Cleared {} entries", removed),
            removed,
        }
    }
}

/// Body of `GET /keys`. Keys are sorted.
#[derive(Debug, Clone, Serialize)]
pub struct KeysResponse {
    pub prefix: Option<String>,
    pub keys: Vec<String>,
    pub count: usize,
}

impl KeysResponse {
    pub fn new(prefix: Option<String>, keys: Vec<String>) -> Self {
        Self {
            prefix,
            count: keys.len(),
            keys,
        }
    }
}

/// Body of `GET /stats`: the cache counters plus the derived hit rate.
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: CacheStats,
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            stats,
        }
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy",
            timestamp: Utc::now(),
        }
    }
}

/// Body of every error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_response_keeps_value_shape() {
        let resp = GetResponse::new("test_key", json!({"rows": 3}));
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json, json!({"key": "test_key", "value": {"rows": 3}}));
    }

    #[test]
    fn test_key_response_messages() {
        assert_eq!(
            KeyResponse::stored("my_key").message,
            "Key 'my_key' set successfully"
        );
        assert_eq!(
            KeyResponse::deleted("my_key").message,
            "Key 'my_key' deleted successfully"
        );
    }

    #[test]
    fn test_stats_response_is_flat() {
        let stats = CacheStats {
            hits: 80,
            misses: 20,
            evictions: 5,
            total_entries: 100,
            total_size: 2048,
        };
        let json = serde_json::to_value(StatsResponse::from(stats)).unwrap();

        assert_eq!(json["hits"], 80);
        assert_eq!(json["total_size"], 2048);
        assert!((json["hit_rate"].as_f64().unwrap() - 0.8).abs() < 0.001);
    }

    #[test]
    fn test_keys_response_count() {
        let resp = KeysResponse::new(None, vec!["a/1".to_string(), "a/2".to_string()]);
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["count"], 2);
        assert_eq!(json["prefix"], Value::Null);
    }

    #[test]
    fn test_clear_response_message() {
        assert_eq!(ClearResponse::new(3).message, "Cleared 3 entries");
    }

    #[test]
    fn test_health_timestamp_is_rfc3339() {
        let json = serde_json::to_value(HealthResponse::healthy()).unwrap();
        let timestamp = json["timestamp"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(timestamp).is_ok());
    }

    #[test]
    fn test_error_response_shape() {
        let json = serde_json::to_value(ErrorResponse::new("Something went wrong")).unwrap();
        assert_eq!(json, json!({"error": "Something went wrong"}));
    }
}
