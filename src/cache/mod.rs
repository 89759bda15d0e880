//! Cache Module
//!
//! Generic TTL cache with batch eviction, usage statistics and optional
//! persistence to a backing store.

pub mod codec;
mod config;
mod entry;
mod policy;
mod stats;
mod store;


// Re-export public types
pub use config::{
    CacheConfig, StorageStrategy, DEFAULT_KEY_PREFIX, DEFAULT_MAX_ENTRIES, DEFAULT_TTL_MS,
};
pub use entry::{current_timestamp_ms, CacheEntry};
pub use policy::{eviction_batch_size, EvictionPolicy};
pub use stats::CacheStats;
pub use store::CacheStore;

/// Store handle shared between request handlers and background tasks
pub type SharedCache<T> = std::sync::Arc<tokio::sync::RwLock<CacheStore<T>>>;

// == Public Constants ==
/// Maximum allowed key length in bytes for keys arriving over the HTTP API
pub const MAX_KEY_LENGTH: usize = 256;
