//! Cache Item Module
//!
//! Defines the value container and bookkeeping shared by both cache engines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// == Cache Item ==
/// A cached value with its size and access bookkeeping.
///
/// The memory engine stores the payload in `value`; the disk engine keeps
/// `CacheItem<()>` in its index and the payload in a file. Only the metadata
/// fields are serialized, which is the shape of the disk index entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheItem<V = serde_json::Value> {
    /// The stored payload
    #[serde(skip)]
    pub value: V,
    /// Byte length of the serialized payload
    pub size: u64,
    /// When the value was written
    pub created_at: DateTime<Utc>,
    /// When the value was last written or read
    pub accessed_at: DateTime<Utc>,
}

impl<V> CacheItem<V> {
    // == Constructor ==
    /// Creates a new item stamped with the current time.
    pub fn new(value: V, size: u64) -> Self {
        let now = Utc::now();
        Self {
            value,
            size,
            created_at: now,
            accessed_at: now,
        }
    }

    // == Touch ==
    /// Marks the item as read now.
    pub fn touch(&mut self) {
        self.accessed_at = Utc::now();
    }

    // == Idle Time ==
    /// Returns how long the item has gone untouched as of `now`.
    pub fn idle_for(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.accessed_at
    }
}
