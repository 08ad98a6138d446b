//! Object Store Module
//!
//! The object-store contract consumed by the SDK and a metadata reader that
//! fronts it with a [`Cache`] so previously read objects are not fetched again.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::Cache;

// == Object Store Contract ==
/// Minimal object storage operations.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> anyhow::Result<()>;
    async fn download(&self, path: &str) -> anyhow::Result<Vec<u8>>;
    async fn delete(&self, path: &str) -> anyhow::Result<()>;
    async fn exists(&self, path: &str) -> anyhow::Result<bool>;
    async fn list(&self, prefix: &str) -> anyhow::Result<Vec<String>>;
}

// == Metadata Reader ==
/// Reads JSON metadata objects through a cache keyed by object path.
pub struct MetadataReader<S> {
    store: S,
    cache: Arc<dyn Cache>,
}

impl<S: ObjectStore> MetadataReader<S> {
    pub fn new(store: S, cache: Arc<dyn Cache>) -> Self {
        Self { store, cache }
    }

    /// Returns the object at `path` decoded as `T`, downloading it only when it
    /// is not cached. A full cache does not fail the read.
    pub async fn read<T: DeserializeOwned>(&self, path: &str) -> anyhow::Result<T> {
        if let Some(value) = self.cache.get(path).await {
            match serde_json::from_value(value) {
                Ok(decoded) => return Ok(decoded),
                Err(err) => debug!("Cached metadata for {} has another shape: {}", path, err),
            }
        }

        let bytes = self.store.download(path).await?;
        let value: Value = serde_json::from_slice(&bytes)?;
        if let Err(err) = self.cache.set(path, value.clone()).await {
            warn!("Not caching metadata for {}: {}", path, err);
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Drops the cached copy of `path`.
    pub async fn invalidate(&self, path: &str) -> anyhow::Result<()> {
        self.cache.delete(path).await?;
        Ok(())
    }

    /// Paths under `prefix` currently served from cache.
    pub async fn cached_paths(&self, prefix: &str) -> Vec<String> {
        self.cache.keys_with_prefix(prefix).await
    }

    /// The wrapped store.
    pub fn store(&self) -> &S {
        &self.store
    }
}
