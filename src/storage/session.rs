//! Process-wide in-memory key-value store.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, RwLock};

use crate::error::{CacheError, Result};
use crate::storage::BackingStore;

static GLOBAL_SESSION: LazyLock<SessionStore> = LazyLock::new(SessionStore::new);

// == Session Store ==
/// Shared string map that outlives individual cache stores but not the process.
///
/// Clones share the same underlying map. An optional byte quota makes
/// writes fail once the stored keys and values would exceed it.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    slots: Arc<RwLock<HashMap<String, String>>>,
    quota_bytes: Option<usize>,
}

impl SessionStore {
    /// Creates an isolated, unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an isolated store that rejects writes beyond `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            slots: Arc::default(),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Handle to the store shared by the whole process.
    pub fn global() -> Self {
        GLOBAL_SESSION.clone()
    }

    fn poisoned() -> CacheError {
        CacheError::Storage("session store lock poisoned".to_string())
    }
}

impl BackingStore for SessionStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let slots = self.slots.read().map_err(|_| Self::poisoned())?;
        Ok(slots.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let mut slots = self.slots.write().map_err(|_| Self::poisoned())?;

        if let Some(quota) = self.quota_bytes {
            let used: usize = slots
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            if used + key.len() + value.len() > quota {
                return Err(CacheError::Storage(format!(
                    "quota of {} bytes exceeded",
                    quota
                )));
            }
        }

        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut slots = self.slots.write().map_err(|_| Self::poisoned())?;
        slots.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let slots = self.slots.read().map_err(|_| Self::poisoned())?;
        Ok(slots.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_read_delete() {
        let store = SessionStore::new();

        store.write("k", "v").unwrap();
        assert_eq!(store.read("k").unwrap(), Some("v".to_string()));

        store.delete("k").unwrap();
        assert_eq!(store.read("k").unwrap(), None);
        assert!(store.delete("k").is_ok());
    }

    #[test]
    fn test_clones_share_slots() {
        let store = SessionStore::new();
        let other = store.clone();

        store.write("shared", "1").unwrap();
        assert_eq!(other.read("shared").unwrap(), Some("1".to_string()));
    }

    #[test]
    fn test_global_is_shared() {
        SessionStore::global()
            .write("session_test_global_k", "v")
            .unwrap();
        assert_eq!(
            SessionStore::global().read("session_test_global_k").unwrap(),
            Some("v".to_string())
        );
        SessionStore::global().delete("session_test_global_k").unwrap();
    }

    #[test]
    fn test_quota_rejects_oversized_write() {
        let store = SessionStore::with_quota(10);

        store.write("ab", "cdef").unwrap();
        let result = store.write("gh", "ijklmn");
        assert!(matches!(result, Err(CacheError::Storage(_))));
        assert_eq!(store.read("gh").unwrap(), None);
    }

    #[test]
    fn test_quota_counts_replacement_once() {
        let store = SessionStore::with_quota(10);

        store.write("ab", "cdefghij").unwrap();
        // Overwriting the same key frees its old footprint first
        store.write("ab", "12345678").unwrap();
        assert_eq!(store.read("ab").unwrap(), Some("12345678".to_string()));
    }

    #[test]
    fn test_keys() {
        let store = SessionStore::new();
        store.write("a", "1").unwrap();
        store.write("b", "2").unwrap();

        let mut keys = store.keys().unwrap();
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
    }
}
