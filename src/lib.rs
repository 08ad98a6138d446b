//! SDK Cache - caching infrastructure for a data-upload SDK
//!
//! Provides size-bounded memory and disk caches with access-time eviction, and
//! a refresh-ahead cache for assume-role credentials.

pub mod api;
pub mod cache;
pub mod config;
pub mod credentials;
pub mod error;
pub mod models;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use cache::{new_cache, Cache, CacheExt, DiskCache, MemoryCache};
pub use config::{CacheConfig, CacheType, Config};
pub use credentials::{CredentialCache, CredentialProvider, StsClient};
pub use store::{MetadataReader, ObjectStore};
pub use tasks::spawn_refresh_task;
