//! Request handlers for the cache service endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::debug;

use crate::cache::{new_cache, Cache};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::models::{
    ClearResponse, GetResponse, HealthResponse, KeyResponse, KeysQuery, KeysResponse, SetRequest,
    StatsResponse,
};

/// State shared by every handler. The engines synchronize internally.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<dyn Cache>,
}

impl AppState {
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self { cache }
    }

    /// Builds the engine named by `config` and serves it.
    pub async fn from_config(config: &CacheConfig) -> Result<Self> {
        Ok(Self::new(new_cache(config).await?))
    }
}

/// PUT /set
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<KeyResponse>> {
    req.validate()?;
    state.cache.set(&req.key, req.value).await?;

    Ok(Json(KeyResponse::stored(req.key)))
}

/// GET /get/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    match state.cache.get(&key).await {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// DELETE /del/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<KeyResponse>> {
    if state.cache.delete(&key).await? {
        Ok(Json(KeyResponse::deleted(key)))
    } else {
        Err(CacheError::NotFound(key))
    }
}

/// DELETE /clear
///
/// The reported count is taken before clearing, so a concurrent write may
/// make it approximate.
pub async fn clear_handler(State(state): State<AppState>) -> Result<Json<ClearResponse>> {
    let removed = state.cache.count().await;
    state.cache.clear().await?;
    debug!("Cleared {} entries over HTTP", removed);

    Ok(Json(ClearResponse::new(removed)))
}

/// GET /keys
pub async fn keys_handler(
    State(state): State<AppState>,
    Query(query): Query<KeysQuery>,
) -> Json<KeysResponse> {
    let keys = match &query.prefix {
        Some(prefix) => state.cache.keys_with_prefix(prefix).await,
        None => state.cache.keys().await,
    };

    Json(KeysResponse::new(query.prefix, keys))
}

/// GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.cache.stats().await))
}

/// GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
