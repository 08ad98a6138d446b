//! Cache Module
//!
//! Size-bounded key/value caches with access-time eviction, in memory or on disk.

mod disk;
mod eviction;
mod item;
mod memory;
mod stats;

#[cfg(test)]
mod property_tests;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::config::{CacheConfig, CacheType};
use crate::error::{CacheError, Result};

// Re-export public types
pub use disk::{sanitize_key, DiskCache, INDEX_FILE_NAME};
pub use eviction::EvictionPlan;
pub use item::CacheItem;
pub use memory::MemoryCache;
pub use stats::CacheStats;

// == Public Constants ==
/// Longest key accepted over the HTTP API; keeps disk file names within
/// common filesystem limits.
pub const MAX_KEY_LENGTH: usize = 200;

// == Cache Contract ==
/// Operations shared by every cache engine.
///
/// A `get` hit refreshes the item's access time. A `set` that would exceed the
/// configured size evicts least recently accessed items first and fails with
/// [`CacheError::CacheFull`] when it cannot make room.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Returns the value for `key`, or `None` on a miss.
    async fn get(&self, key: &str) -> Option<Value>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Removes `key`. Returns whether a value was removed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Removes every key.
    async fn clear(&self) -> Result<()>;

    /// Total size in bytes of the stored values.
    async fn size(&self) -> u64;

    /// Number of stored keys.
    async fn count(&self) -> usize;

    /// All keys, sorted.
    async fn keys(&self) -> Vec<String>;

    /// Keys starting with `prefix`, sorted.
    async fn keys_with_prefix(&self, prefix: &str) -> Vec<String>;

    /// Current statistics.
    async fn stats(&self) -> CacheStats;

    /// Releases the cache. The disk engine flushes its index, the memory
    /// engine drops its items.
    async fn close(&self) -> Result<()>;
}

// == Typed Access ==
/// Typed helpers over [`Cache`].
#[async_trait]
pub trait CacheExt: Cache {
    /// Returns the value for `key` decoded as `T`. A value that does not
    /// decode as `T` is reported as a miss.
    async fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key).await?;
        serde_json::from_value(value).ok()
    }

    /// Encodes `value` and stores it under `key`.
    async fn set_as<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.set(key, value).await
    }
}

impl<C: Cache + ?Sized> CacheExt for C {}

// == Factory ==
/// Builds the cache engine named by `config`.
pub async fn new_cache(config: &CacheConfig) -> Result<Arc<dyn Cache>> {
    config.validate()?;
    match config.cache_type {
        CacheType::Memory => Ok(Arc::new(MemoryCache::new(config))),
        CacheType::Disk => Ok(Arc::new(DiskCache::new(config).await?)),
    }
}

/// Byte length of the serialized value, the unit of capacity accounting.
pub(crate) fn encoded_size(value: &Value) -> Result<u64> {
    Ok(serde_json::to_vec(value)?.len() as u64)
}

/// Bytes that must be freed to store `incoming` bytes, given `current` bytes
/// already stored of which `replaced` belong to the key being overwritten.
pub(crate) fn deficit(current: u64, replaced: u64, incoming: u64, max_size: u64) -> u64 {
    if max_size == 0 {
        return 0;
    }
    (current - replaced + incoming).saturating_sub(max_size)
}

pub(crate) fn cache_full() -> CacheError {
    CacheError::CacheFull("unable to evict sufficient space".to_string())
}

#[cfg(test)]
/// Collects formatted log lines written while `f` runs.
pub(crate) fn captured_logs(f: impl FnOnce()) -> String {
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[derive(Clone)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Write for Buffer {
        fn write(&mut self, bytes: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(bytes);
            Ok(bytes.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    let buffer = Buffer(Arc::new(Mutex::new(Vec::new())));
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    tracing::subscriber::with_default(subscriber, f);

    let bytes = buffer.0.lock().unwrap().clone();
    String::from_utf8(bytes).unwrap()
}
