//! Credential cache errors

use thiserror::Error;

/// Errors returned while obtaining scoped credentials.
///
/// Cloneable so a single refresh result can be handed to every waiter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// Construction parameters rejected
    #[error("invalid credential configuration: {0}")]
    InvalidConfig(String),

    /// The token exchange failed
    #[error("failed to assume role: {0}")]
    AssumeRole(String),

    /// The token exchange returned an unparsable expiration
    #[error("invalid credential expiration '{0}'")]
    InvalidExpiration(String),

    /// The caller's deadline elapsed before a credential was available
    #[error("deadline exceeded waiting for credentials")]
    DeadlineExceeded,

    /// The refresh task died
    #[error("internal error: {0}")]
    Internal(String),
}
