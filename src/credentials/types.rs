//! Credential types and the token-exchange seam.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::credentials::CredentialError;

/// Requested lifetime of an exchanged credential, in seconds.
pub const ASSUME_ROLE_DURATION_SECONDS: u32 = 3600;

const SESSION_NAME_PREFIX: &str = "sdk-session-";

const REDACTED: &str = "***";

// == Base Credentials ==
/// Long-lived identity used to sign the token exchange.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseCredentials {
    pub access_key_id: String,
    pub access_key_secret: String,
}

impl BaseCredentials {
    pub fn new(access_key_id: impl Into<String>, access_key_secret: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            access_key_secret: access_key_secret.into(),
        }
    }
}

impl fmt::Debug for BaseCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &REDACTED)
            .finish()
    }
}

// == Assume Role Request ==
/// Parameters of one token exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssumeRoleRequest {
    pub role_arn: String,
    pub role_session_name: String,
    pub duration_seconds: u32,
    pub region: String,
}

impl AssumeRoleRequest {
    /// Builds a request whose session name records `now` for traceability.
    pub fn new(role_arn: &str, region: &str, now: DateTime<Utc>) -> Self {
        Self {
            role_arn: role_arn.to_string(),
            role_session_name: format!("{}{}", SESSION_NAME_PREFIX, now.timestamp()),
            duration_seconds: ASSUME_ROLE_DURATION_SECONDS,
            region: region.to_string(),
        }
    }
}

// == Assume Role Response ==
/// Raw token-exchange result; `expiration` is an RFC 3339 timestamp.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AssumeRoleResponse {
    pub access_key_id: String,
    pub access_key_secret: String,
    pub security_token: String,
    pub expiration: String,
}

impl fmt::Debug for AssumeRoleResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssumeRoleResponse")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &REDACTED)
            .field("security_token", &REDACTED)
            .field("expiration", &self.expiration)
            .finish()
    }
}

// == Assume Role Credentials ==
/// A short-lived scoped credential. Published snapshots are never mutated.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssumeRoleCredentials {
    pub access_key_id: String,
    pub access_key_secret: String,
    pub security_token: String,
    pub expiration: DateTime<Utc>,
}

impl TryFrom<AssumeRoleResponse> for AssumeRoleCredentials {
    type Error = CredentialError;

    fn try_from(response: AssumeRoleResponse) -> Result<Self, Self::Error> {
        let expiration = DateTime::parse_from_rfc3339(&response.expiration)
            .map_err(|_| CredentialError::InvalidExpiration(response.expiration.clone()))?
            .with_timezone(&Utc);
        Ok(Self {
            access_key_id: response.access_key_id,
            access_key_secret: response.access_key_secret,
            security_token: response.security_token,
            expiration,
        })
    }
}

impl fmt::Debug for AssumeRoleCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssumeRoleCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &REDACTED)
            .field("security_token", &REDACTED)
            .field("expiration", &self.expiration)
            .finish()
    }
}

// == Session Credentials ==
/// What a credential consumer receives; valid for immediate use.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCredentials {
    pub access_key_id: String,
    pub access_key_secret: String,
    pub security_token: String,
}

impl From<&AssumeRoleCredentials> for SessionCredentials {
    fn from(credentials: &AssumeRoleCredentials) -> Self {
        Self {
            access_key_id: credentials.access_key_id.clone(),
            access_key_secret: credentials.access_key_secret.clone(),
            security_token: credentials.security_token.clone(),
        }
    }
}

impl fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &REDACTED)
            .field("security_token", &REDACTED)
            .finish()
    }
}

// == Seams ==
/// Client for the security-token service.
#[async_trait]
pub trait StsClient: Send + Sync {
    /// Exchanges `base` for a scoped credential described by `request`.
    async fn assume_role(
        &self,
        base: &BaseCredentials,
        request: &AssumeRoleRequest,
    ) -> anyhow::Result<AssumeRoleResponse>;
}

/// Source of credentials for storage providers.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn get_credentials(&self) -> Result<SessionCredentials, CredentialError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn response(expiration: &str) -> AssumeRoleResponse {
        AssumeRoleResponse {
            access_key_id: "STS.id".to_string(),
            access_key_secret: "secret".to_string(),
            security_token: "token".to_string(),
            expiration: expiration.to_string(),
        }
    }

    #[test]
    fn test_request_session_name() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let request = AssumeRoleRequest::new("acs:ram::1:role/upload", "cn-hangzhou", now);

        assert_eq!(request.role_session_name, "sdk-session-1714521600");
        assert_eq!(request.duration_seconds, 3600);
        assert_eq!(request.region, "cn-hangzhou");
    }

    #[test]
    fn test_parse_expiration() {
        let credentials =
            AssumeRoleCredentials::try_from(response("2024-05-01T01:00:00Z")).unwrap();

        assert_eq!(
            credentials.expiration,
            Utc.with_ymd_and_hms(2024, 5, 1, 1, 0, 0).unwrap()
        );
        assert_eq!(credentials.security_token, "token");
    }

    #[test]
    fn test_parse_expiration_with_offset() {
        let credentials =
            AssumeRoleCredentials::try_from(response("2024-05-01T09:00:00+08:00")).unwrap();

        assert_eq!(
            credentials.expiration,
            Utc.with_ymd_and_hms(2024, 5, 1, 1, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_invalid_expiration() {
        let result = AssumeRoleCredentials::try_from(response("tomorrow"));
        assert_eq!(
            result,
            Err(CredentialError::InvalidExpiration("tomorrow".to_string()))
        );
    }

    #[test]
    fn test_response_wire_names() {
        let json = r#"{
            "AccessKeyId": "STS.id",
            "AccessKeySecret": "secret",
            "SecurityToken": "token",
            "Expiration": "2024-05-01T01:00:00Z"
        }"#;
        let parsed: AssumeRoleResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, response("2024-05-01T01:00:00Z"));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let credentials =
            AssumeRoleCredentials::try_from(response("2024-05-01T01:00:00Z")).unwrap();
        let rendered = format!("{:?}", credentials);

        assert!(rendered.contains("STS.id"));
        assert!(!rendered.contains("\"secret\""));
        assert!(!rendered.contains("\"token\""));
    }
}
