//! Cache Configuration Module
//!
//! Construction-time settings for a [`CacheStore`](crate::cache::CacheStore).

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::cache::EvictionPolicy;

/// Default entry validity window: 5 minutes
pub const DEFAULT_TTL_MS: u64 = 5 * 60 * 1000;

/// Default soft cap on stored entries
pub const DEFAULT_MAX_ENTRIES: usize = 100;

/// Default prefix applied to keys in the backing store
pub const DEFAULT_KEY_PREFIX: &str = "cache_";

// == Storage Strategy ==
/// Backing medium for persisted entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StorageStrategy {
    /// Process memory only, nothing is persisted
    #[default]
    Memory,
    /// Durable directory store, one file per key
    Local,
    /// Process-wide shared key-value store, gone when the process exits
    Session,
    /// Single JSON document file holding every persisted key
    Structured,
}

impl StorageStrategy {
    /// Whether entries are written beyond process memory.
    pub fn persists(&self) -> bool {
        !matches!(self, StorageStrategy::Memory)
    }
}

impl FromStr for StorageStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageStrategy::Memory),
            "local" | "persistenta" => Ok(StorageStrategy::Local),
            "session" | "persistentb" => Ok(StorageStrategy::Session),
            "structured" | "structuredstore" => Ok(StorageStrategy::Structured),
            other => Err(format!("unknown storage strategy '{}'", other)),
        }
    }
}

impl fmt::Display for StorageStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StorageStrategy::Memory => "memory",
            StorageStrategy::Local => "local",
            StorageStrategy::Session => "session",
            StorageStrategy::Structured => "structured",
        };
        f.write_str(name)
    }
}

// == Cache Config ==
/// Cache store configuration. Not mutable after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Backing medium
    pub strategy: StorageStrategy,
    /// Default TTL in milliseconds for entries without an explicit TTL
    pub ttl_ms: u64,
    /// Soft cap on in-memory entries
    pub max_entries: usize,
    /// Gzip persisted entries
    pub compress: bool,
    /// Pass persisted entries through a reversible byte mask.
    ///
    /// This hides values from casual inspection only. It uses no key
    /// material and is not encryption.
    pub obfuscate: bool,
    /// Victim ranking when the store is full
    pub eviction: EvictionPolicy,
    /// Namespace for keys in the backing store
    pub key_prefix: String,
    /// Location of `local` and `structured` backing data
    pub storage_dir: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            strategy: StorageStrategy::Memory,
            ttl_ms: DEFAULT_TTL_MS,
            max_entries: DEFAULT_MAX_ENTRIES,
            compress: false,
            obfuscate: false,
            eviction: EvictionPolicy::Lfu,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            storage_dir: PathBuf::from("./cache-data"),
        }
    }
}

impl CacheConfig {
    /// Memory-only config with the given capacity and default TTL.
    pub fn in_memory(max_entries: usize, ttl_ms: u64) -> Self {
        Self {
            max_entries,
            ttl_ms,
            ..Self::default()
        }
    }

    /// Prefixed key used in the backing store.
    pub fn storage_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}
