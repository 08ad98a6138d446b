//! Credential Cache Module
//!
//! Serves one scoped credential obtained through an assume-role exchange,
//! refreshing it ahead of expiry. Concurrent callers that need a refresh join
//! a single shared exchange instead of starting their own.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::credentials::{
    AssumeRoleCredentials, AssumeRoleRequest, BaseCredentials, CredentialError,
    CredentialProvider, SessionCredentials, StsClient,
};
use crate::tasks::spawn_refresh_task;

/// A credential with less than this left to live is refreshed.
pub const REFRESH_THRESHOLD: Duration = Duration::from_secs(15 * 60);

/// Interval of the background refresher.
pub const BACKGROUND_REFRESH_INTERVAL: Duration = Duration::from_secs(5 * 60);

type RefreshResult = Result<Arc<AssumeRoleCredentials>, CredentialError>;
type PendingRefresh = Shared<BoxFuture<'static, RefreshResult>>;

// == Refresh Policy ==
/// Returns true once `expiration` is within [`REFRESH_THRESHOLD`] of now.
pub fn needs_refresh(expiration: DateTime<Utc>) -> bool {
    needs_refresh_at(expiration, Utc::now())
}

/// Returns true iff `now + REFRESH_THRESHOLD >= expiration`.
pub fn needs_refresh_at(expiration: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    let threshold =
        chrono::Duration::from_std(REFRESH_THRESHOLD).unwrap_or(chrono::Duration::zero());
    now + threshold >= expiration
}

#[derive(Default)]
struct CredentialState {
    /// Current snapshot, replaced wholesale on every refresh
    cached: Option<Arc<AssumeRoleCredentials>>,
    /// Exchange in flight, shared by every caller waiting on it
    in_flight: Option<PendingRefresh>,
}

struct Inner {
    base: BaseCredentials,
    client: Arc<dyn StsClient>,
    role_arn: String,
    region: String,
    state: RwLock<CredentialState>,
}

impl Inner {
    /// Runs one exchange and publishes its outcome. A failure leaves the
    /// cached snapshot in place.
    async fn exchange(&self) -> RefreshResult {
        let request = AssumeRoleRequest::new(&self.role_arn, &self.region, Utc::now());
        debug!(
            "Assuming role {} as session {}",
            request.role_arn, request.role_session_name
        );

        let result = match self.client.assume_role(&self.base, &request).await {
            Ok(response) => AssumeRoleCredentials::try_from(response).map(Arc::new),
            Err(err) => Err(CredentialError::AssumeRole(format!("{:#}", err))),
        };

        let mut state = self.state.write().await;
        state.in_flight = None;
        match &result {
            Ok(credentials) => {
                info!(
                    "Refreshed credentials for role {}, expiring at {}",
                    self.role_arn, credentials.expiration
                );
                state.cached = Some(Arc::clone(credentials));
            }
            Err(err) => warn!("Credential refresh for role {} failed: {}", self.role_arn, err),
        }
        result
    }
}

// == Credential Cache ==
/// Refresh-ahead cache over an assume-role token exchange.
///
/// Cloning is cheap and clones share the cached credential.
#[derive(Clone)]
pub struct CredentialCache {
    inner: Arc<Inner>,
}

impl CredentialCache {
    // == Constructor ==
    /// Creates an empty cache. Fails when the base credential, role ARN or
    /// region is empty.
    pub fn new(
        base: BaseCredentials,
        client: Arc<dyn StsClient>,
        role_arn: impl Into<String>,
        region: impl Into<String>,
    ) -> Result<Self, CredentialError> {
        let role_arn = role_arn.into();
        let region = region.into();

        if base.access_key_id.is_empty() || base.access_key_secret.is_empty() {
            return Err(CredentialError::InvalidConfig(
                "base credentials are required".to_string(),
            ));
        }
        if role_arn.is_empty() {
            return Err(CredentialError::InvalidConfig(
                "role ARN cannot be empty".to_string(),
            ));
        }
        if region.is_empty() {
            return Err(CredentialError::InvalidConfig(
                "region cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            inner: Arc::new(Inner {
                base,
                client,
                role_arn,
                region,
                state: RwLock::new(CredentialState::default()),
            }),
        })
    }

    // == Get ==
    /// Returns a usable scoped credential.
    ///
    /// A valid cached credential is returned without I/O. A near-expiry one is
    /// refreshed by the caller, unless a refresh is already running, in which
    /// case the cached one is returned. With nothing cached the caller waits
    /// for the exchange. Exchange errors are returned as is.
    pub async fn assume_role_credentials(&self) -> RefreshResult {
        {
            let state = self.inner.state.read().await;
            if let Some(cached) = &state.cached {
                if !needs_refresh(cached.expiration) || state.in_flight.is_some() {
                    return Ok(Arc::clone(cached));
                }
            }
        }
        self.refresh().await
    }

    /// Like [`CredentialProvider::get_credentials`] with a deadline. The
    /// exchange itself keeps running for other callers when the deadline hits.
    pub async fn get_credentials_with_timeout(
        &self,
        timeout: Duration,
    ) -> Result<SessionCredentials, CredentialError> {
        tokio::time::timeout(timeout, self.get_credentials())
            .await
            .map_err(|_| CredentialError::DeadlineExceeded)?
    }

    /// Current snapshot, if any.
    pub async fn cached(&self) -> Option<Arc<AssumeRoleCredentials>> {
        self.inner.state.read().await.cached.clone()
    }

    /// Whether an exchange is in flight.
    pub async fn is_refreshing(&self) -> bool {
        self.inner.state.read().await.in_flight.is_some()
    }

    /// Starts the background refresher. Abort the handle to stop it.
    pub fn start_background_refresh(&self) -> JoinHandle<()> {
        spawn_refresh_task(self.clone(), BACKGROUND_REFRESH_INTERVAL)
    }

    /// Refreshes when a cached credential exists, is near expiry and no
    /// exchange is running. Returns `None` when nothing was attempted.
    pub(crate) async fn refresh_if_stale(&self) -> Option<RefreshResult> {
        {
            let state = self.inner.state.read().await;
            let stale = state
                .cached
                .as_ref()
                .is_some_and(|cached| needs_refresh(cached.expiration));
            if !stale || state.in_flight.is_some() {
                return None;
            }
        }
        Some(self.refresh().await)
    }

    /// Joins the running exchange or starts one. The state is re-checked under
    /// the write lock so that callers racing past the read path do not start a
    /// second exchange.
    async fn refresh(&self) -> RefreshResult {
        let pending = {
            let mut state = self.inner.state.write().await;
            if let Some(cached) = &state.cached {
                if !needs_refresh(cached.expiration) || state.in_flight.is_some() {
                    return Ok(Arc::clone(cached));
                }
            }
            match state.in_flight.clone() {
                Some(pending) => pending,
                None => {
                    let pending = self.start_exchange();
                    state.in_flight = Some(pending.clone());
                    pending
                }
            }
        };
        pending.await
    }

    /// Spawns the exchange so that a waiter giving up never cancels it.
    fn start_exchange(&self) -> PendingRefresh {
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move { inner.exchange().await });

        let inner = Arc::clone(&self.inner);
        async move {
            match task.await {
                Ok(result) => result,
                Err(err) => {
                    inner.state.write().await.in_flight = None;
                    Err(CredentialError::Internal(format!(
                        "credential refresh task failed: {}",
                        err
                    )))
                }
            }
        }
        .boxed()
        .shared()
    }

    #[cfg(test)]
    pub(crate) async fn seed(&self, credentials: AssumeRoleCredentials) {
        self.inner.state.write().await.cached = Some(Arc::new(credentials));
    }
}

#[async_trait]
impl CredentialProvider for CredentialCache {
    async fn get_credentials(&self) -> Result<SessionCredentials, CredentialError> {
        let credentials = self.assume_role_credentials().await?;
        Ok(SessionCredentials::from(credentials.as_ref()))
    }
}

impl fmt::Debug for CredentialCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialCache")
            .field("base", &self.inner.base)
            .field("role_arn", &self.inner.role_arn)
            .field("region", &self.inner.region)
            .finish_non_exhaustive()
    }
}
