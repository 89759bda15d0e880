//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::warn;

use crate::cache::CacheConfig;

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// Settings for the shared cache store
    pub cache: CacheConfig,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 60)
    /// - `CACHE_STRATEGY` - memory | local | session | structured (default: memory)
    /// - `CACHE_TTL_MS` - Default entry TTL in milliseconds (default: 300000)
    /// - `CACHE_MAX_ENTRIES` - Soft cap on entries (default: 100)
    /// - `CACHE_COMPRESS` - Gzip persisted entries (default: false)
    /// - `CACHE_OBFUSCATE` - Mask persisted entries, not encryption (default: false)
    /// - `CACHE_EVICTION` - lfu | lru (default: lfu)
    /// - `CACHE_KEY_PREFIX` - Backing store key prefix (default: cache_)
    /// - `CACHE_STORAGE_DIR` - Directory for local/structured data (default: ./cache-data)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let cache_defaults = defaults.cache.clone();

        Self {
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            cleanup_interval: parse_var("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
            cache: CacheConfig {
                strategy: parse_var("CACHE_STRATEGY").unwrap_or(cache_defaults.strategy),
                ttl_ms: parse_var("CACHE_TTL_MS").unwrap_or(cache_defaults.ttl_ms),
                max_entries: parse_var("CACHE_MAX_ENTRIES").unwrap_or(cache_defaults.max_entries),
                compress: parse_var("CACHE_COMPRESS").unwrap_or(cache_defaults.compress),
                obfuscate: parse_var("CACHE_OBFUSCATE").unwrap_or(cache_defaults.obfuscate),
                eviction: parse_var("CACHE_EVICTION").unwrap_or(cache_defaults.eviction),
                key_prefix: env::var("CACHE_KEY_PREFIX").unwrap_or(cache_defaults.key_prefix),
                storage_dir: env::var("CACHE_STORAGE_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(cache_defaults.storage_dir),
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            cleanup_interval: 60,
            cache: CacheConfig::default(),
        }
    }
}

/// Reads and parses `name`; unset or unparseable values yield None.
fn parse_var<T>(name: &str) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring invalid {}={:?}: {}", name, raw, e);
            None
        }
    }
}
