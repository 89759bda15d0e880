//! TTL Cleanup Task
//!
//! Background task that periodically sweeps expired cache entries.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::SharedCache;

/// Spawns a background task that runs `cleanup()` on the store every
/// `cleanup_interval_secs` seconds.
///
/// The returned handle is the only way to stop the task; abort it when the
/// owning scope shuts down.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(RwLock::new(CacheStore::<Value>::new(CacheConfig::default())));
/// let cleanup_handle = spawn_cleanup_task(cache.clone(), 60);
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task<T>(cache: SharedCache<T>, cleanup_interval_secs: u64) -> JoinHandle<()>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    spawn_cleanup_task_every(cache, Duration::from_secs(cleanup_interval_secs))
}

/// Same as [`spawn_cleanup_task`] with an arbitrary period.
pub fn spawn_cleanup_task_every<T>(cache: SharedCache<T>, interval: Duration) -> JoinHandle<()>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!("Starting TTL cleanup task with interval of {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            let removed = {
                let mut cache_guard = cache.write().await;
                cache_guard.cleanup()
            };

            if removed > 0 {
                info!("TTL cleanup: removed {} expired entries", removed);
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheConfig, CacheStore};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    fn shared_store() -> SharedCache<String> {
        Arc::new(RwLock::new(CacheStore::new(CacheConfig::in_memory(100, 300_000))))
    }

    #[tokio::test]
    async fn test_cleanup_task_removes_expired_entries() {
        let cache = shared_store();
        cache
            .write()
            .await
            .set("expire_soon".to_string(), "value".to_string(), Some(50));

        let handle = spawn_cleanup_task_every(cache.clone(), Duration::from_millis(100));

        tokio::time::sleep(Duration::from_millis(350)).await;

        assert!(
            !cache.read().await.contains_key("expire_soon"),
            "Expired entry should have been cleaned up"
        );

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_preserves_valid_entries() {
        let cache = shared_store();
        cache
            .write()
            .await
            .set("long_lived".to_string(), "value".to_string(), Some(3_600_000));

        let handle = spawn_cleanup_task_every(cache.clone(), Duration::from_millis(50));

        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(
            cache.write().await.get("long_lived"),
            Some("value".to_string()),
            "Valid entry should not be removed"
        );

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let handle = spawn_cleanup_task(shared_store(), 1);

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
