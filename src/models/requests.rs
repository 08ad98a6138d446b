//! Incoming request bodies and query strings.

use serde::Deserialize;
use serde_json::Value;

use crate::cache::MAX_KEY_LENGTH;
use crate::error::{CacheError, Result};

/// Body of `PUT /set`. Any JSON value may be stored.
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    pub key: String,
    pub value: Value,
}

impl SetRequest {
    /// Rejects keys the engines cannot store under a usable file name.
    pub fn validate(&self) -> Result<()> {
        if self.key.is_empty() {
            return Err(CacheError::InvalidRequest("Key cannot be empty".to_string()));
        }
        if self.key.len() > MAX_KEY_LENGTH {
            return Err(CacheError::InvalidRequest(format!(
                "Key exceeds maximum length of {} characters",
                MAX_KEY_LENGTH
            )));
        }
        Ok(())
    }
}

/// Query string of `GET /keys`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeysQuery {
    #[serde(default)]
    pub prefix: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(key: &str) -> SetRequest {
        SetRequest {
            key: key.to_string(),
            value: json!(null),
        }
    }

    #[test]
    fn test_set_request_accepts_any_json_value() {
        let json = r#"{"key": "batch/7", "value": {"parts": [1, 2]}}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.key, "batch/7");
        assert_eq!(req.value, json!({"parts": [1, 2]}));
    }

    #[test]
    fn test_set_request_requires_value() {
        let parsed = serde_json::from_str::<SetRequest>(r#"{"key": "k"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_validate_key_length() {
        assert!(matches!(
            request("").validate(),
            Err(CacheError::InvalidRequest(_))
        ));
        assert!(request(&"k".repeat(MAX_KEY_LENGTH)).validate().is_ok());
        assert!(request(&"k".repeat(MAX_KEY_LENGTH + 1)).validate().is_err());
    }

    #[test]
    fn test_keys_query_prefix_optional() {
        let query: KeysQuery = serde_json::from_str("{}").unwrap();
        assert!(query.prefix.is_none());
    }
}
