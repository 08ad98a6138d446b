//! Credentials Module
//!
//! Short-lived scoped credentials obtained through an assume-role exchange,
//! cached and refreshed ahead of expiry.

mod cache;
mod error;
mod types;

pub use cache::{
    needs_refresh, needs_refresh_at, CredentialCache, BACKGROUND_REFRESH_INTERVAL,
    REFRESH_THRESHOLD,
};
pub use error::CredentialError;
pub use types::{
    AssumeRoleCredentials, AssumeRoleRequest, AssumeRoleResponse, BaseCredentials,
    CredentialProvider, SessionCredentials, StsClient, ASSUME_ROLE_DURATION_SECONDS,
};
