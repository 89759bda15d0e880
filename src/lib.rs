//! Query Cache - A pluggable TTL cache for data-fetching call sites
//!
//! Provides a generic cache store with TTL expiration, batch eviction,
//! optional persistence and a single-flight cached-fetch helper, plus a
//! small JSON API for running one shared store as a service.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod models;
pub mod storage;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheConfig, CacheStats, CacheStore, SharedCache};
pub use config::Config;
pub use fetch::CachedFetcher;
pub use tasks::spawn_cleanup_task;
