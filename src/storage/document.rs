//! Single-document store: every key lives in one JSON object on disk.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex};

use crate::error::{CacheError, Result};
use crate::storage::{write_atomic, BackingStore};

type Document = BTreeMap<String, String>;
type PathLock = Arc<Mutex<()>>;

/// One read-modify-write lock per document path, shared by every handle
static DOCUMENT_LOCKS: LazyLock<Mutex<HashMap<PathBuf, PathLock>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

fn poisoned() -> CacheError {
    CacheError::Storage("document store lock poisoned".to_string())
}

fn lock_for(path: &Path) -> Result<PathLock> {
    let mut locks = DOCUMENT_LOCKS.lock().map_err(|_| poisoned())?;
    Ok(locks.entry(path.to_path_buf()).or_default().clone())
}

// == Document Store ==
/// Store backed by one JSON file of the form `{"key": "value", ...}`.
///
/// Each operation reads the document, applies the change and rewrites it.
/// Handles opened on the same file serialize their changes.
#[derive(Debug)]
pub struct DocumentStore {
    path: PathBuf,
    dir: PathBuf,
    lock: PathLock,
}

impl DocumentStore {
    /// Opens the document at `path`, creating parent directories as needed.
    ///
    /// An existing file must be a valid document.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path.file_name().ok_or_else(|| {
            CacheError::Storage(format!("document path '{}' has no file name", path.display()))
        })?;
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        let dir = fs::canonicalize(parent)?;
        let path = dir.join(name);
        let store = Self {
            lock: lock_for(&path)?,
            path,
            dir,
        };
        store.load()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Document> {
        match fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(Document::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Document::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn modify<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut Document) -> bool,
    {
        let _guard = self.lock.lock().map_err(|_| poisoned())?;
        let mut document = self.load()?;
        if change(&mut document) {
            write_atomic(&self.dir, &self.path, &serde_json::to_vec(&document)?)?;
        }
        Ok(())
    }
}

impl BackingStore for DocumentStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.modify(|doc| {
            doc.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.modify(|doc| doc.remove(key).is_some())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.load()?.into_keys().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_read_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::open(dir.path().join("cache.json")).unwrap();

        store.write("cache_a", "1").unwrap();
        store.write("cache_b", "2").unwrap();
        assert_eq!(store.read("cache_a").unwrap(), Some("1".to_string()));
        assert_eq!(store.keys().unwrap(), vec!["cache_a", "cache_b"]);

        store.delete("cache_a").unwrap();
        assert_eq!(store.read("cache_a").unwrap(), None);
        assert!(store.delete("cache_a").is_ok());
    }

    #[test]
    fn test_file_is_a_json_object() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::open(dir.path().join("cache.json")).unwrap();
        store.write("k", "v").unwrap();

        let raw = fs::read_to_string(store.path()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed["k"], "v");
    }

    #[test]
    fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cache.json");
        DocumentStore::open(&path).unwrap().write("k", "v").unwrap();

        let reopened = DocumentStore::open(&path).unwrap();
        assert_eq!(reopened.read("k").unwrap(), Some("v".to_string()));
    }

    #[test]
    fn test_handles_on_one_path_share_lock() {
        let dir = tempfile::tempdir().unwrap();
        let first = DocumentStore::open(dir.path().join("cache.json")).unwrap();
        let second = DocumentStore::open(dir.path().join(".").join("cache.json")).unwrap();
        let other = DocumentStore::open(dir.path().join("other.json")).unwrap();

        assert_eq!(first.path(), second.path());
        assert!(Arc::ptr_eq(&first.lock, &second.lock));
        assert!(!Arc::ptr_eq(&first.lock, &other.lock));
    }

    #[test]
    fn test_concurrent_handles_keep_every_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let vehicles = DocumentStore::open(&path).unwrap();
        let invoices = DocumentStore::open(&path).unwrap();

        std::thread::scope(|scope| {
            for (store, prefix) in [(&vehicles, "vehicles_"), (&invoices, "invoices_")] {
                scope.spawn(move || {
                    for i in 0..200 {
                        store.write(&format!("{}{}", prefix, i), "v").unwrap();
                    }
                });
            }
        });

        let reopened = DocumentStore::open(&path).unwrap();
        assert_eq!(reopened.keys().unwrap().len(), 400);

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|item| item.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("cache.json")]);
    }

    #[test]
    fn test_open_rejects_corrupt_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, "not json").unwrap();

        assert!(DocumentStore::open(&path).is_err());
    }
}
