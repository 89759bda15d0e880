//! Cached Fetch
//!
//! Wraps an async producer so repeated calls for the same key are served
//! from a shared cache store.
//!
//! Concurrent misses on one key are collapsed: the first caller runs the
//! producer while the rest wait on a per-key gate, then read its result from
//! the cache. If the producer fails nothing is stored and the next waiter
//! runs its own producer.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::cache::SharedCache;

type Gate = Arc<tokio::sync::Mutex<()>>;

// == Cached Fetcher ==
/// Cache-aside helper over a [`SharedCache`].
pub struct CachedFetcher<T> {
    cache: SharedCache<T>,
    in_flight: Mutex<HashMap<String, Gate>>,
}

impl<T> CachedFetcher<T>
where
    T: Clone + Serialize + DeserializeOwned,
{
    pub fn new(cache: SharedCache<T>) -> Self {
        Self {
            cache,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn cache(&self) -> &SharedCache<T> {
        &self.cache
    }

    // == Fetch ==
    /// Returns the cached value for `key`, or runs `producer` and caches its
    /// result with the store's default TTL.
    ///
    /// Producer errors are returned unchanged and nothing is cached.
    pub async fn fetch<F, Fut, E>(&self, key: &str, producer: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.fetch_with_ttl(key, None, producer).await
    }

    /// Same as [`fetch`](Self::fetch) with an explicit TTL for a produced value.
    pub async fn fetch_with_ttl<F, Fut, E>(
        &self,
        key: &str,
        ttl_ms: Option<u64>,
        producer: F,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.cache.write().await.get(key) {
            return Ok(value);
        }

        let gate = self.gate(key);
        let guard = gate.lock().await;

        // Another caller may have filled the key while we waited
        if let Some(value) = self.cache.read().await.peek(key) {
            debug!("Cached fetch for '{}' served by in-flight producer", key);
            drop(guard);
            self.release(key, gate);
            return Ok(value);
        }

        let result = producer().await;
        if let Ok(value) = &result {
            self.cache
                .write()
                .await
                .set(key.to_string(), value.clone(), ttl_ms);
        }

        drop(guard);
        self.release(key, gate);
        result
    }

    /// Number of keys with a producer currently running or awaited.
    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().map(|map| map.len()).unwrap_or(0)
    }

    fn gate(&self, key: &str) -> Gate {
        let mut map = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        map.entry(key.to_string()).or_default().clone()
    }

    // Clones are only created and dropped under the map lock, so the last
    // caller out sees a count of one and removes the entry
    fn release(&self, key: &str, gate: Gate) {
        let mut map = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        drop(gate);
        if map.get(key).is_some_and(|g| Arc::strong_count(g) == 1) {
            map.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheConfig, CacheStore};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::RwLock;

    fn fetcher(ttl_ms: u64) -> CachedFetcher<String> {
        let store = CacheStore::new(CacheConfig::in_memory(100, ttl_ms));
        CachedFetcher::new(Arc::new(RwLock::new(store)))
    }

    #[tokio::test]
    async fn test_second_fetch_is_served_from_cache() {
        let fetcher = fetcher(300_000);
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let value = fetcher
                .fetch("vehicles", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>("fleet".to_string())
                })
                .await
                .unwrap();
            assert_eq!(value, "fleet");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let stats = fetcher.cache().read().await.stats();
        assert_eq!(stats.total_hits, 1);
        assert_eq!(stats.total_misses, 1);
    }

    #[tokio::test]
    async fn test_producer_error_propagates_and_is_not_cached() {
        let fetcher = fetcher(300_000);

        let result = fetcher
            .fetch("contracts", || async { Err::<String, _>("db down") })
            .await;
        assert_eq!(result, Err("db down"));
        assert!(fetcher.cache().read().await.is_empty());

        // Next call retries the producer
        let result = fetcher
            .fetch("contracts", || async { Ok::<_, &str>("ok".to_string()) })
            .await;
        assert_eq!(result, Ok("ok".to_string()));
    }

    #[tokio::test]
    async fn test_expired_value_is_refetched() {
        let fetcher = fetcher(300_000);
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            fetcher
                .fetch_with_ttl("k", Some(20), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>("v".to_string())
                })
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_millis(40)).await;
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_misses_run_producer_once() {
        let fetcher = Arc::new(fetcher(300_000));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let fetcher = fetcher.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                fetcher
                    .fetch("customers", || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok::<_, String>("list".to_string())
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), Ok("list".to_string()));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(fetcher.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_block_each_other() {
        let fetcher = Arc::new(fetcher(300_000));

        let slow = {
            let fetcher = fetcher.clone();
            tokio::spawn(async move {
                fetcher
                    .fetch("slow", || async {
                        tokio::time::sleep(Duration::from_millis(200)).await;
                        Ok::<_, String>("s".to_string())
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        let fast = tokio::time::timeout(
            Duration::from_millis(100),
            fetcher.fetch("fast", || async { Ok::<_, String>("f".to_string()) }),
        )
        .await;

        assert_eq!(fast.unwrap(), Ok("f".to_string()));
        assert_eq!(slow.await.unwrap(), Ok("s".to_string()));
    }
}
