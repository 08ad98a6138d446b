//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the capacity bound, recency ordering and prefix search
//! across both engines.

use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::time::Duration;

use crate::cache::{Cache, DiskCache, MemoryCache};
use crate::config::CacheConfig;

// == Strategies ==
/// Generates cache keys with a small alphabet so prefixes overlap often
fn key_strategy() -> impl Strategy<Value = String> {
    "[ab/]{1,6}".prop_map(|s| s)
}

/// Generates values of varying encoded size
fn value_strategy() -> impl Strategy<Value = Value> {
    "[a-z]{0,40}".prop_map(Value::String)
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // *For any* sequence of writes into a bounded cache, the stored size never
    // exceeds the bound unless the last write reported a capacity error.
    #[test]
    fn prop_capacity_bound(
        writes in prop::collection::vec((key_strategy(), value_strategy()), 1..60),
        max_size in 20u64..200,
    ) {
        runtime().block_on(async {
            let cache = MemoryCache::new(&CacheConfig::memory(max_size, Duration::ZERO));
            for (key, value) in writes {
                let result = cache.set(&key, value).await;
                let size = cache.size().await;
                prop_assert!(
                    size <= max_size || result.is_err(),
                    "size {} exceeds max {}",
                    size,
                    max_size
                );
                if result.is_ok() {
                    prop_assert!(cache.get(&key).await.is_some(), "stored key '{}' missing", key);
                }
            }
            Ok(())
        })?;
    }

    // *For any* key set and prefix, prefix search returns exactly the keys
    // starting with the prefix, whatever the insertion order.
    #[test]
    fn prop_prefix_search_matches_filter(
        keys in prop::collection::vec(key_strategy(), 0..30),
        prefix in "[ab/]{0,3}",
    ) {
        runtime().block_on(async {
            let cache = MemoryCache::new(&CacheConfig::default());
            for key in &keys {
                cache.set(key, json!(1)).await.unwrap();
            }

            let expected: Vec<String> = cache
                .keys()
                .await
                .into_iter()
                .filter(|key| key.starts_with(&prefix))
                .collect();
            prop_assert_eq!(cache.keys_with_prefix(&prefix).await, expected);

            let unique: HashSet<&String> = keys.iter().collect();
            prop_assert_eq!(cache.count().await, unique.len());
            Ok(())
        })?;
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(10))]

    // *For any* read order over a full cache, the next eviction removes the key
    // read least recently.
    #[test]
    fn prop_eviction_respects_recency(
        order in Just((0..5usize).collect::<Vec<_>>()).prop_shuffle(),
    ) {
        runtime().block_on(async {
            // Five 10-byte values fill the cache exactly.
            let cache = MemoryCache::new(&CacheConfig::memory(50, Duration::ZERO));
            for i in 0..5 {
                cache.set(&format!("k{}", i), json!("12345678")).await.unwrap();
            }
            for &i in &order {
                tokio::time::sleep(Duration::from_millis(2)).await;
                cache.get(&format!("k{}", i)).await.unwrap();
            }

            cache.set("fresh", json!("12345678")).await.unwrap();

            let evicted = format!("k{}", order[0]);
            prop_assert!(cache.get(&evicted).await.is_none(), "'{}' should be evicted", evicted);
            for &i in &order[1..] {
                let key = format!("k{}", i);
                prop_assert!(cache.get(&key).await.is_some(), "'{}' should survive", key);
            }
            Ok(())
        })?;
    }

    // *For any* sequence of writes, the disk engine's index and the value
    // files it leaves behind agree.
    #[test]
    fn prop_disk_index_matches_files(
        writes in prop::collection::vec(("[a-d]{1,2}", value_strategy()), 1..20),
    ) {
        runtime().block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let config = CacheConfig::disk(dir.path().join("cache"), 120, Duration::ZERO);
            let cache = DiskCache::new(&config).await.unwrap();
            for (key, value) in writes {
                let _ = cache.set(&key, value).await;
            }

            let mut on_disk: Vec<String> = std::fs::read_dir(cache.dir())
                .unwrap()
                .filter_map(|entry| {
                    let name = entry.unwrap().file_name().to_string_lossy().into_owned();
                    name.strip_suffix(".cache").map(str::to_string)
                })
                .collect();
            on_disk.sort();
            prop_assert_eq!(on_disk, cache.keys().await);
            prop_assert!(cache.size().await <= 120);
            Ok(())
        })?;
    }
}
