//! Eviction Planner Module
//!
//! Chooses which items to drop when a write would exceed the size bound.
//! Both engines run the same plan and then remove the victims from their own
//! storage.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::cache::CacheItem;

// == Eviction Plan ==
/// Outcome of planning an eviction.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct EvictionPlan {
    /// Keys to remove, oldest access first
    pub victims: Vec<String>,
    /// Total size of the victims
    pub freed: u64,
    /// Whether `freed` covers the requested deficit
    pub sufficient: bool,
}

// == Plan ==
/// Picks victims freeing at least `needed` bytes.
///
/// When `eviction_time` is non-zero, items idle longer than it are considered
/// first. If they are absent or too small in total, every item is considered.
/// Candidates are taken oldest `accessed_at` first until the deficit is covered.
/// `protected` is never chosen (the key being written).
///
/// An insufficient plan still lists every candidate: the caller evicts them and
/// then fails the write.
pub fn plan<V>(
    items: &HashMap<String, CacheItem<V>>,
    needed: u64,
    eviction_time: Duration,
    protected: Option<&str>,
    now: DateTime<Utc>,
) -> EvictionPlan {
    let eligible = || {
        items
            .iter()
            .filter(move |(key, _)| Some(key.as_str()) != protected)
    };

    let mut candidates: Vec<(&String, &CacheItem<V>)> = Vec::new();
    if !eviction_time.is_zero() {
        candidates = eligible()
            .filter(|(_, item)| {
                item.idle_for(now)
                    .to_std()
                    .is_ok_and(|idle| idle > eviction_time)
            })
            .collect();
    }

    let stale_total: u64 = candidates.iter().map(|(_, item)| item.size).sum();
    if candidates.is_empty() || stale_total < needed {
        candidates = eligible().collect();
    }

    candidates.sort_by_key(|(_, item)| item.accessed_at);

    let mut plan = EvictionPlan::default();
    for (key, item) in candidates {
        if plan.freed >= needed {
            break;
        }
        plan.freed += item.size;
        plan.victims.push(key.clone());
    }
    plan.sufficient = plan.freed >= needed;
    plan
}
