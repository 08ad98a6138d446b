//! Configuration Module
//!
//! Handles loading cache and server configuration from environment variables.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{CacheError, Result};

// == Cache Type ==
/// Storage engine backing a cache instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheType {
    #[default]
    Memory,
    Disk,
}

impl FromStr for CacheType {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(CacheType::Memory),
            "disk" => Ok(CacheType::Disk),
            other => Err(CacheError::InvalidConfig(format!(
                "unknown cache type '{}', expected memory or disk",
                other
            ))),
        }
    }
}

impl fmt::Display for CacheType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheType::Memory => write!(f, "memory"),
            CacheType::Disk => write!(f, "disk"),
        }
    }
}

// == Cache Config ==
/// Per-instance cache configuration.
#[derive(Debug, Clone, Default)]
pub struct CacheConfig {
    /// Storage engine
    pub cache_type: CacheType,
    /// Capacity in bytes of serialized values, 0 = unbounded
    pub max_size: u64,
    /// Storage directory, required for the disk engine
    pub disk_path: Option<PathBuf>,
    /// Items untouched longer than this are evicted first, zero disables the preference
    pub eviction_time: Duration,
}

impl CacheConfig {
    /// Creates an in-memory configuration.
    pub fn memory(max_size: u64, eviction_time: Duration) -> Self {
        Self {
            cache_type: CacheType::Memory,
            max_size,
            disk_path: None,
            eviction_time,
        }
    }

    /// Creates a disk configuration rooted at `path`.
    pub fn disk(path: impl Into<PathBuf>, max_size: u64, eviction_time: Duration) -> Self {
        Self {
            cache_type: CacheType::Disk,
            max_size,
            disk_path: Some(path.into()),
            eviction_time,
        }
    }

    /// Loads a cache configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_TYPE` - `memory` or `disk` (default: memory)
    /// - `CACHE_MAX_SIZE` - Capacity in bytes, 0 = unbounded (default: 0)
    /// - `CACHE_DISK_PATH` - Storage directory for the disk engine (default: unset)
    /// - `CACHE_EVICTION_TIME_MS` - Eviction-time preference in milliseconds (default: 0)
    pub fn from_env() -> Self {
        Self {
            cache_type: env::var("CACHE_TYPE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            max_size: env::var("CACHE_MAX_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            disk_path: env::var("CACHE_DISK_PATH")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            eviction_time: env::var("CACHE_EVICTION_TIME_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(Duration::ZERO),
        }
    }

    /// Checks that the configuration can build a cache.
    pub fn validate(&self) -> Result<()> {
        if self.cache_type == CacheType::Disk && self.disk_path.is_none() {
            return Err(CacheError::InvalidConfig(
                "disk cache requires a disk path".to_string(),
            ));
        }
        Ok(())
    }
}

// == Server Config ==
/// Local cache service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Cache served by the service
    pub cache: CacheConfig,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// Reads the `CACHE_*` variables described on [`CacheConfig::from_env`] and
    /// `SERVER_PORT` (default: 3000).
    pub fn from_env() -> Self {
        Self {
            cache: CacheConfig::from_env(),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            server_port: 3000,
        }
    }
}
