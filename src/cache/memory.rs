//! Memory Cache Module
//!
//! In-process cache engine: one map guarded by a single lock.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::{cache_full, deficit, encoded_size, eviction, Cache, CacheItem, CacheStats};
use crate::config::CacheConfig;
use crate::error::Result;

#[derive(Debug, Default)]
struct MemoryState {
    items: HashMap<String, CacheItem>,
    total_size: u64,
    stats: CacheStats,
}

impl MemoryState {
    fn remove(&mut self, key: &str) -> Option<CacheItem> {
        let item = self.items.remove(key)?;
        self.total_size -= item.size;
        Some(item)
    }
}

// == Memory Cache ==
/// Cache engine holding values in process memory.
#[derive(Debug)]
pub struct MemoryCache {
    state: RwLock<MemoryState>,
    max_size: u64,
    eviction_time: Duration,
}

impl MemoryCache {
    // == Constructor ==
    /// Creates an empty cache bounded by `config.max_size`.
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            state: RwLock::new(MemoryState::default()),
            max_size: config.max_size,
            eviction_time: config.eviction_time,
        }
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Option<Value> {
        // Write lock: a hit updates the access time.
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        match state.items.get_mut(key) {
            Some(item) => {
                item.touch();
                let value = item.value.clone();
                state.stats.record_hit();
                debug!("Memory cache hit for '{}'", key);
                Some(value)
            }
            None => {
                state.stats.record_miss();
                debug!("Memory cache miss for '{}'", key);
                None
            }
        }
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let size = encoded_size(&value)?;
        let mut state = self.state.write().await;

        let replaced = state.items.get(key).map_or(0, |item| item.size);
        let needed = deficit(state.total_size, replaced, size, self.max_size);
        if needed > 0 {
            let plan = eviction::plan(
                &state.items,
                needed,
                self.eviction_time,
                Some(key),
                Utc::now(),
            );
            for victim in &plan.victims {
                state.remove(victim);
            }
            state.stats.record_evictions(plan.victims.len());
            debug!(
                "Evicted {} items ({} bytes) to store '{}'",
                plan.victims.len(),
                plan.freed,
                key
            );
            if !plan.sufficient {
                return Err(cache_full());
            }
        }

        state.remove(key);
        state.items.insert(key.to_string(), CacheItem::new(value, size));
        state.total_size += size;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut state = self.state.write().await;
        Ok(state.remove(key).is_some())
    }

    async fn clear(&self) -> Result<()> {
        let mut state = self.state.write().await;
        state.items.clear();
        state.total_size = 0;
        Ok(())
    }

    async fn size(&self) -> u64 {
        self.state.read().await.total_size
    }

    async fn count(&self) -> usize {
        self.state.read().await.items.len()
    }

    async fn keys(&self) -> Vec<String> {
        let state = self.state.read().await;
        let mut keys: Vec<String> = state.items.keys().cloned().collect();
        keys.sort();
        keys
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let state = self.state.read().await;
        let mut keys: Vec<String> = state
            .items
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    async fn stats(&self) -> CacheStats {
        let state = self.state.read().await;
        state.stats.snapshot(state.items.len(), state.total_size)
    }

    async fn close(&self) -> Result<()> {
        self.clear().await
    }
}
