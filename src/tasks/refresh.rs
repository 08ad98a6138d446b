//! Credential Refresh Task
//!
//! Background task that keeps a cached credential from going stale while the
//! process sees no traffic.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::credentials::CredentialCache;

/// Spawns a background task that periodically refreshes a near-expiry
/// credential.
///
/// Each tick refreshes only when a credential is cached, is within the refresh
/// threshold and no exchange is already running. The result is discarded: a
/// failed refresh is retried by the next synchronous caller or the next tick.
///
/// # Arguments
/// * `cache` - The credential cache to keep warm
/// * `interval` - Time between checks
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during shutdown.
pub fn spawn_refresh_task(cache: CredentialCache, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting credential refresh task with interval of {:?}",
            interval
        );

        loop {
            tokio::time::sleep(interval).await;

            match cache.refresh_if_stale().await {
                Some(Ok(credentials)) => info!(
                    "Background refresh: credentials now expire at {}",
                    credentials.expiration
                ),
                Some(Err(err)) => warn!("Background refresh failed: {}", err),
                None => debug!("Background refresh: nothing to refresh"),
            }
        }
    })
}
