//! Directory-backed store, one file per key.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::storage::{write_atomic, BackingStore, TMP_SUFFIX};

// == File Store ==
/// Durable store keeping each key in its own file.
///
/// File names are the hex encoding of the key, so any key is a valid name.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(hex::encode(key))
    }
}

impl BackingStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        write_atomic(&self.dir, &self.path_for(key), value.as_bytes())
    }

    fn delete(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for item in fs::read_dir(&self.dir)? {
            let name = item?.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if name.ends_with(TMP_SUFFIX) {
                continue;
            }
            // Foreign files in the directory are not ours to list
            let Some(key) = hex::decode(name).ok().and_then(|b| String::from_utf8(b).ok()) else {
                continue;
            };
            keys.push(key);
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_read_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        assert_eq!(store.read("cache_a").unwrap(), None);

        store.write("cache_a", "{\"x\":1}").unwrap();
        assert_eq!(store.read("cache_a").unwrap(), Some("{\"x\":1}".to_string()));

        store.delete("cache_a").unwrap();
        assert_eq!(store.read("cache_a").unwrap(), None);
    }

    #[test]
    fn test_delete_missing_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        assert!(store.delete("nothing").is_ok());
    }

    #[test]
    fn test_keys_with_awkward_characters() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        store.write("cache_contracts/2024?page=1", "1").unwrap();
        store.write("cache_../escape", "2").unwrap();

        let mut keys = store.keys().unwrap();
        keys.sort();
        assert_eq!(keys, vec!["cache_../escape", "cache_contracts/2024?page=1"]);
        assert_eq!(store.read("cache_../escape").unwrap(), Some("2".to_string()));
    }

    #[test]
    fn test_keys_skips_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        fs::write(dir.path().join("README.txt"), "hi").unwrap();

        store.write("cache_k", "v").unwrap();
        assert_eq!(store.keys().unwrap(), vec!["cache_k".to_string()]);
    }

    #[test]
    fn test_concurrent_writers_on_one_key() {
        let dir = tempfile::tempdir().unwrap();
        let first = FileStore::open(dir.path()).unwrap();
        let second = FileStore::open(dir.path()).unwrap();

        std::thread::scope(|scope| {
            for (store, value) in [(&first, "1"), (&second, "2")] {
                scope.spawn(move || {
                    for _ in 0..100 {
                        store.write("cache_shared", value).unwrap();
                    }
                });
            }
        });

        let value = first.read("cache_shared").unwrap().unwrap();
        assert!(value == "1" || value == "2");
        assert_eq!(first.keys().unwrap(), vec!["cache_shared".to_string()]);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1, "no temp files left");
    }

    #[test]
    fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        FileStore::open(dir.path()).unwrap().write("cache_k", "v").unwrap();

        let reopened = FileStore::open(dir.path()).unwrap();
        assert_eq!(reopened.read("cache_k").unwrap(), Some("v".to_string()));
    }

    #[test]
    fn test_open_creates_nested_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = FileStore::open(&nested).unwrap();
        assert!(store.dir().is_dir());
    }
}
