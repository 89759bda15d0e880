//! Cache Store Module
//!
//! Main cache engine: an in-memory map of TTL entries with optional
//! write-through to a backing store, batch eviction and usage statistics.

use std::collections::HashMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::codec;
use crate::cache::entry::current_timestamp_ms;
use crate::cache::policy::eviction_batch_size;
use crate::cache::{CacheConfig, CacheEntry, CacheStats};
use crate::storage::{build_backing, BackingStore};

// == Cache Store ==
/// Keyed store of time-boxed entries.
///
/// Persistence and codec failures are logged and swallowed: no operation on
/// the store fails its caller. Expired entries are dropped lazily, by
/// [`cleanup`](Self::cleanup) or by being overwritten.
pub struct CacheStore<T> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<T>>,
    /// Usage statistics
    stats: CacheStats,
    /// Construction-time settings
    config: CacheConfig,
    /// Persistent medium, None for memory-only stores
    backing: Option<Box<dyn BackingStore>>,
    /// Logical clock for insertion order and recency
    clock: u64,
}

impl<T> CacheStore<T>
where
    T: Clone + Serialize + DeserializeOwned,
{
    // == Constructor ==
    /// Creates a store with the backing medium selected by `config.strategy`.
    ///
    /// If the medium cannot be opened the store runs memory-only.
    pub fn new(config: CacheConfig) -> Self {
        let backing = match build_backing(&config) {
            Ok(backing) => backing,
            Err(e) => {
                warn!(
                    "Backing store for strategy '{}' unavailable, using memory only: {}",
                    config.strategy, e
                );
                None
            }
        };
        Self::build(config, backing)
    }

    /// Creates a store that mirrors entries into `backing`, whatever the strategy says.
    pub fn with_backing(config: CacheConfig, backing: Box<dyn BackingStore>) -> Self {
        Self::build(config, Some(backing))
    }

    fn build(config: CacheConfig, backing: Option<Box<dyn BackingStore>>) -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
            config,
            backing,
            clock: 0,
        }
    }

    // == Set ==
    /// Stores `value` under `key`, valid for `ttl_ms` or the configured default.
    ///
    /// Overwrites any existing entry and resets its access count. Inserting a
    /// new key into a full store first evicts 20% of the entries, persisted
    /// copies included.
    pub fn set(&mut self, key: String, value: T, ttl_ms: Option<u64>) {
        let entry = CacheEntry::new(value, ttl_ms.unwrap_or(self.config.ttl_ms));
        self.insert(key.clone(), entry);
        if let Some(entry) = self.entries.get(&key) {
            self.persist(&key, entry);
        }
    }

    // == Get ==
    /// Returns a clone of the value for `key` if present and not expired.
    ///
    /// Falls back to the backing store when the key is not in memory.
    /// Expired entries count as misses but are left in place.
    pub fn get(&mut self, key: &str) -> Option<T> {
        if !self.entries.contains_key(key) {
            if let Some(entry) = self.load(key) {
                self.insert(key.to_string(), entry);
            }
        }

        let tick = self.tick();
        match self.entries.get_mut(key) {
            Some(entry) if !entry.is_expired() => {
                entry.record_access();
                entry.last_touch = tick;
                let data = entry.data.clone();
                self.stats.record_hit();
                Some(data)
            }
            _ => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Peek ==
    /// Memory-only lookup that records no statistics and no access.
    pub fn peek(&self, key: &str) -> Option<T> {
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.data.clone())
    }

    // == Remove ==
    /// Deletes `key` from memory and the backing store. No-op when absent.
    pub fn remove(&mut self, key: &str) {
        self.entries.remove(key);
        self.stats.set_cache_size(self.entries.len());
        self.unpersist(key);
    }

    // == Clear ==
    /// Drops every entry, including persisted ones under this store's prefix.
    ///
    /// Statistics are cumulative and survive a clear.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.stats.set_cache_size(0);

        for storage_key in self.persisted_keys() {
            self.delete_persisted(&storage_key);
        }
    }

    // == Cleanup Expired ==
    /// Removes all expired entries.
    ///
    /// Persisted copies of expired entries are deleted too, including ones
    /// that were never loaded into memory. Returns the number of in-memory
    /// entries removed.
    pub fn cleanup(&mut self) -> usize {
        let now = current_timestamp_ms();
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();
        for key in &expired_keys {
            self.entries.remove(key);
            self.unpersist(key);
        }
        self.stats.set_cache_size(self.entries.len());

        for storage_key in self.persisted_keys() {
            let key = &storage_key[self.config.key_prefix.len()..];
            if self.entries.contains_key(key) {
                continue;
            }
            let expired = self
                .decode_persisted(&storage_key)
                .map_or(false, |entry| entry.is_expired_at(now));
            if expired {
                self.delete_persisted(&storage_key);
            }
        }

        count
    }

    // == Stats ==
    /// Returns a statistics snapshot with size and footprint filled in.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_cache_size(self.entries.len());
        stats.memory_usage = self
            .entries
            .iter()
            .map(|(key, entry)| key.len() + serde_json::to_vec(entry).map_or(0, |b| b.len()))
            .sum();
        stats
    }

    // == Length ==
    /// Returns the current number of in-memory entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Whether entries are mirrored to a backing store.
    pub fn is_persistent(&self) -> bool {
        self.backing.is_some()
    }

    // == Internals ==

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn insert(&mut self, key: String, mut entry: CacheEntry<T>) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.config.max_entries {
            self.evict();
        }

        let tick = self.tick();
        entry.sequence = tick;
        entry.last_touch = tick;
        self.entries.insert(key, entry);
        self.stats.set_cache_size(self.entries.len());
    }

    fn evict(&mut self) {
        let batch = eviction_batch_size(self.entries.len());
        let victims = self.config.eviction.select_victims(&self.entries, batch);

        for key in &victims {
            self.entries.remove(key);
            self.unpersist(key);
        }
        self.stats.record_evictions(victims.len());
        debug!(
            "Evicted {} entries ({} policy): {:?}",
            victims.len(),
            self.config.eviction,
            victims
        );
    }

    fn persist(&self, key: &str, entry: &CacheEntry<T>) {
        let Some(backing) = &self.backing else {
            return;
        };
        let storage_key = self.config.storage_key(key);
        let result = codec::encode(entry, self.config.compress, self.config.obfuscate)
            .and_then(|text| backing.write(&storage_key, &text));
        if let Err(e) = result {
            warn!("Failed to persist cache entry '{}': {}", storage_key, e);
        }
    }

    fn load(&self, key: &str) -> Option<CacheEntry<T>> {
        let entry = self.decode_persisted(&self.config.storage_key(key))?;
        if entry.is_expired() {
            return None;
        }
        debug!("Loaded cache entry '{}' from backing store", key);
        Some(entry)
    }

    fn decode_persisted(&self, storage_key: &str) -> Option<CacheEntry<T>> {
        let backing = self.backing.as_ref()?;
        let text = match backing.read(storage_key) {
            Ok(Some(text)) => text,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read cache entry '{}': {}", storage_key, e);
                return None;
            }
        };
        match codec::decode(&text, self.config.compress, self.config.obfuscate) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Ignoring undecodable cache entry '{}': {}", storage_key, e);
                None
            }
        }
    }

    fn unpersist(&self, key: &str) {
        if self.backing.is_some() {
            self.delete_persisted(&self.config.storage_key(key));
        }
    }

    fn delete_persisted(&self, storage_key: &str) {
        let Some(backing) = &self.backing else {
            return;
        };
        if let Err(e) = backing.delete(storage_key) {
            warn!("Failed to delete cache entry '{}': {}", storage_key, e);
        }
    }

    fn persisted_keys(&self) -> Vec<String> {
        let Some(backing) = &self.backing else {
            return Vec::new();
        };
        match backing.keys() {
            Ok(keys) => keys
                .into_iter()
                .filter(|k| k.starts_with(&self.config.key_prefix))
                .collect(),
            Err(e) => {
                warn!("Failed to list persisted cache keys: {}", e);
                Vec::new()
            }
        }
    }
}

impl<T> fmt::Debug for CacheStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("entries", &self.entries.len())
            .field("stats", &self.stats)
            .field("config", &self.config)
            .field("persistent", &self.backing.is_some())
            .finish()
    }
}
