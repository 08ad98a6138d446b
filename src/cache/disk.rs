//! Disk Cache Module
//!
//! File-backed cache engine. Each value lives in its own file and an in-memory
//! index of item metadata, persisted as JSON after every mutation, is the
//! authority for counts, sizes and keys.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::cache::{cache_full, deficit, eviction, Cache, CacheItem, CacheStats};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

/// Name of the index file inside the storage directory.
pub const INDEX_FILE_NAME: &str = ".cache_index.json";

const VALUE_FILE_EXTENSION: &str = "cache";

// == Key Mapping ==
/// Maps a cache key to a file stem by replacing path-unsafe characters with `_`.
pub fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            other => other,
        })
        .collect()
}

#[derive(Debug, Default)]
struct DiskState {
    index: HashMap<String, CacheItem<()>>,
    total_size: u64,
    stats: CacheStats,
}

impl DiskState {
    fn remove(&mut self, key: &str) -> Option<CacheItem<()>> {
        let item = self.index.remove(key)?;
        self.total_size -= item.size;
        Some(item)
    }

    /// Other live keys stored under the same file name as `key`.
    fn colliding_keys(&self, key: &str) -> Vec<String> {
        let stem = sanitize_key(key);
        self.index
            .keys()
            .filter(|other| other.as_str() != key && sanitize_key(other) == stem)
            .cloned()
            .collect()
    }
}

#[derive(Debug)]
struct DiskInner {
    dir: PathBuf,
    index_path: PathBuf,
    state: RwLock<DiskState>,
    max_size: u64,
    eviction_time: Duration,
}

impl DiskInner {
    fn value_path(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", sanitize_key(key), VALUE_FILE_EXTENSION))
    }

    async fn remove_value_file(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.value_path(key)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Writes the index through a temporary file so a crash never leaves a
    /// truncated index behind.
    async fn persist_index(&self, state: &DiskState) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(&state.index)?;
        let tmp_path = self.index_path.with_extension("json.tmp");
        fs::write(&tmp_path, bytes).await?;
        fs::rename(&tmp_path, &self.index_path).await?;
        Ok(())
    }

    /// Drops an unreadable entry, unless it was rewritten since it was read.
    async fn purge(&self, key: &str, created_at: DateTime<Utc>) {
        let mut state = self.state.write().await;
        let unchanged = state
            .index
            .get(key)
            .is_some_and(|item| item.created_at == created_at);
        if !unchanged {
            return;
        }

        state.remove(key);
        if let Err(err) = self.remove_value_file(key).await {
            warn!("Failed to remove unreadable cache file for '{}': {}", key, err);
        }
        if let Err(err) = self.persist_index(&state).await {
            warn!("Failed to persist cache index after purge: {}", err);
        }
    }
}

async fn read_value(path: &Path) -> Result<Value> {
    let bytes = fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

// == Disk Cache ==
/// Cache engine storing values as JSON files under one directory.
///
/// Construction wipes the directory: an instance never resumes the contents
/// left by a previous one.
#[derive(Debug, Clone)]
pub struct DiskCache {
    inner: Arc<DiskInner>,
}

impl DiskCache {
    // == Constructor ==
    /// Creates an empty cache in `config.disk_path`, removing anything already
    /// stored there.
    pub async fn new(config: &CacheConfig) -> Result<Self> {
        let dir = config.disk_path.clone().ok_or_else(|| {
            CacheError::InvalidConfig("disk cache requires a disk path".to_string())
        })?;

        match fs::remove_dir_all(&dir).await {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
        fs::create_dir_all(&dir).await?;

        info!("Disk cache initialized at {}", dir.display());

        Ok(Self {
            inner: Arc::new(DiskInner {
                index_path: dir.join(INDEX_FILE_NAME),
                dir,
                state: RwLock::new(DiskState::default()),
                max_size: config.max_size,
                eviction_time: config.eviction_time,
            }),
        })
    }

    /// Storage directory of this cache.
    pub fn dir(&self) -> &Path {
        &self.inner.dir
    }
}

#[async_trait]
impl Cache for DiskCache {
    async fn get(&self, key: &str) -> Option<Value> {
        let created_at = {
            let mut state = self.inner.state.write().await;
            match state.index.get(key) {
                Some(item) => item.created_at,
                None => {
                    state.stats.record_miss();
                    debug!("Disk cache miss for '{}'", key);
                    return None;
                }
            }
        };

        // File I/O happens outside the lock.
        match read_value(&self.inner.value_path(key)).await {
            Ok(value) => {
                let mut state = self.inner.state.write().await;
                if let Some(item) = state.index.get_mut(key) {
                    item.touch();
                }
                state.stats.record_hit();
                debug!("Disk cache hit for '{}'", key);
                if let Err(err) = self.inner.persist_index(&state).await {
                    warn!("Failed to persist cache index: {}", err);
                }
                Some(value)
            }
            Err(err) => {
                warn!("Treating unreadable cache entry '{}' as a miss: {}", key, err);
                self.inner.state.write().await.stats.record_miss();

                let inner = Arc::clone(&self.inner);
                let key = key.to_string();
                tokio::spawn(async move {
                    inner.purge(&key, created_at).await;
                });
                None
            }
        }
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let bytes = serde_json::to_vec(&value)?;
        let size = bytes.len() as u64;
        let mut state = self.inner.state.write().await;

        // The new value overwrites their file, so they must not stay live.
        for other in state.colliding_keys(key) {
            state.remove(&other);
            self.inner.remove_value_file(&other).await?;
            debug!("Dropped '{}': its file name collides with '{}'", other, key);
        }

        let replaced = state.index.get(key).map_or(0, |item| item.size);
        let needed = deficit(state.total_size, replaced, size, self.inner.max_size);
        if needed > 0 {
            let plan = eviction::plan(
                &state.index,
                needed,
                self.inner.eviction_time,
                Some(key),
                Utc::now(),
            );
            let mut evicted = 0;
            let mut failure = None;
            for victim in &plan.victims {
                state.remove(victim);
                evicted += 1;
                if let Err(err) = self.inner.remove_value_file(victim).await {
                    failure = Some(err);
                    break;
                }
            }
            state.stats.record_evictions(evicted);
            if let Some(err) = failure {
                self.inner.persist_index(&state).await?;
                return Err(err);
            }
            debug!(
                "Evicted {} items ({} bytes) to store '{}'",
                evicted, plan.freed, key
            );
            if !plan.sufficient {
                self.inner.persist_index(&state).await?;
                return Err(cache_full());
            }
        }

        fs::write(self.inner.value_path(key), &bytes).await?;
        state.remove(key);
        state.index.insert(key.to_string(), CacheItem::new((), size));
        state.total_size += size;
        self.inner.persist_index(&state).await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut state = self.inner.state.write().await;
        if state.remove(key).is_none() {
            return Ok(false);
        }
        self.inner.remove_value_file(key).await?;
        self.inner.persist_index(&state).await?;
        Ok(true)
    }

    async fn clear(&self) -> Result<()> {
        let mut state = self.inner.state.write().await;
        let keys: Vec<String> = state.index.keys().cloned().collect();
        for key in &keys {
            state.remove(key);
            self.inner.remove_value_file(key).await?;
        }
        self.inner.persist_index(&state).await
    }

    async fn size(&self) -> u64 {
        self.inner.state.read().await.total_size
    }

    async fn count(&self) -> usize {
        self.inner.state.read().await.index.len()
    }

    async fn keys(&self) -> Vec<String> {
        let state = self.inner.state.read().await;
        let mut keys: Vec<String> = state.index.keys().cloned().collect();
        keys.sort();
        keys
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let state = self.inner.state.read().await;
        let mut keys: Vec<String> = state
            .index
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    async fn stats(&self) -> CacheStats {
        let state = self.inner.state.read().await;
        state.stats.snapshot(state.index.len(), state.total_size)
    }

    async fn close(&self) -> Result<()> {
        let state = self.inner.state.read().await;
        self.inner.persist_index(&state).await?;
        info!(
            "Disk cache at {} closed with {} entries",
            self.inner.dir.display(),
            state.index.len()
        );
        Ok(())
    }
}
