//! Backing Store Module
//!
//! Persistent key-value media that a cache store mirrors its entries into.
//!
//! # Media
//! - `FileStore`: durable directory, one file per key
//! - `SessionStore`: process-wide shared map
//! - `DocumentStore`: one JSON document holding every key

mod document;
mod file;
mod session;

pub use document::DocumentStore;
pub use file::FileStore;
pub use session::SessionStore;

use std::io::Write;
use std::path::Path;

use crate::cache::{CacheConfig, StorageStrategy};
use crate::error::Result;

/// File name used by [`DocumentStore`] inside the configured storage directory
pub const DOCUMENT_FILE_NAME: &str = "cache.json";

/// Suffix of in-progress writes
pub(crate) const TMP_SUFFIX: &str = ".tmp";

// == Backing Store Trait ==
/// String-keyed storage medium shared by key-prefix convention.
///
/// Writes may fail (capacity, permissions, serialization); callers must
/// tolerate that.
pub trait BackingStore: Send + Sync {
    /// Returns the stored text for `key`, if any.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn write(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. Absent keys are not an error.
    fn delete(&self, key: &str) -> Result<()>;

    /// Lists every stored key, including ones owned by other prefixes.
    fn keys(&self) -> Result<Vec<String>>;
}

// == Build Backing ==
/// Creates the backing store selected by `config.strategy`.
///
/// Returns `Ok(None)` for [`StorageStrategy::Memory`].
pub fn build_backing(config: &CacheConfig) -> Result<Option<Box<dyn BackingStore>>> {
    let backing: Box<dyn BackingStore> = match config.strategy {
        StorageStrategy::Memory => return Ok(None),
        StorageStrategy::Local => Box::new(FileStore::open(&config.storage_dir)?),
        StorageStrategy::Session => Box::new(SessionStore::global()),
        StorageStrategy::Structured => Box::new(DocumentStore::open(
            config.storage_dir.join(DOCUMENT_FILE_NAME),
        )?),
    };
    Ok(Some(backing))
}

// == Atomic Write ==
/// Replaces `target` with `bytes` through a uniquely named temp file in `dir`.
///
/// Concurrent writers never share a temp path; the last rename wins.
pub(crate) fn write_atomic(dir: &Path, target: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp = tempfile::Builder::new()
        .suffix(TMP_SUFFIX)
        .tempfile_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}
