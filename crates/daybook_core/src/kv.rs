//! Persistent key-value storage.
//!
//! The sync layer persists three small pieces of state through this
//! interface: the serialized session token pair, the pending-operation
//! queue, and the change-feed cursor. Each lives under its own key and is
//! written as one unit.

use crate::error::{CoreError, CoreResult};
use fs2::FileExt;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

/// The host environment's persistent key-value storage.
///
/// Keys and values are plain strings; values are typically JSON documents
/// serialized by the caller. Implementations must be thread-safe.
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> CoreResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> CoreResult<()>;

    /// Removes the value stored under `key`.
    ///
    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> CoreResult<()>;
}

/// An in-memory key-value store for tests and ephemeral use.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> CoreResult<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> CoreResult<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

/// A file-backed key-value store.
///
/// All entries are kept in one JSON document on disk, rewritten atomically
/// (temp file then rename) on every mutation. The volume of state stored
/// here is tiny, so whole-document writes are acceptable.
///
/// An exclusive advisory lock on a sibling `.lock` file ensures only one
/// process opens the store at a time; a second open fails with
/// [`CoreError::StoreLocked`].
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    entries: RwLock<HashMap<String, String>>,
    /// Held for the lifetime of the store.
    _lock_file: File,
}

impl FileKeyValueStore {
    /// Opens or creates a store at the given path.
    ///
    /// Parent directories are created if needed. Unreadable or unparseable
    /// content is treated as an empty store rather than an error; consumers
    /// of individual keys apply their own fail-closed handling.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StoreLocked`] if another process holds the
    /// lock, or an I/O error if the files cannot be opened.
    pub fn open(path: &Path) -> CoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let lock_path = path.with_extension("lock");
        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;
        if lock_file.try_lock_exclusive().is_err() {
            return Err(CoreError::StoreLocked);
        }

        let entries = match fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_default(),
            Err(_) => HashMap::new(),
        };

        Ok(Self {
            path: path.to_path_buf(),
            entries: RwLock::new(entries),
            _lock_file: lock_file,
        })
    }

    /// Returns the path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &HashMap<String, String>) -> CoreResult<()> {
        let raw = serde_json::to_string(entries)?;
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, raw)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> CoreResult<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        let mut entries = self.entries.write();
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> CoreResult<()> {
        let mut entries = self.entries.write();
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryKeyValueStore::new();
        assert_eq!(store.get("k").unwrap(), None);

        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v".to_string()));

        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        {
            let store = FileKeyValueStore::open(&path).unwrap();
            store.set("cursor", "42").unwrap();
            store.set("queue", "[]").unwrap();
        }

        let store = FileKeyValueStore::open(&path).unwrap();
        assert_eq!(store.get("cursor").unwrap(), Some("42".to_string()));
        assert_eq!(store.get("queue").unwrap(), Some("[]".to_string()));
    }

    #[test]
    fn file_store_second_open_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        let _held = FileKeyValueStore::open(&path).unwrap();
        let second = FileKeyValueStore::open(&path);
        assert!(matches!(second, Err(CoreError::StoreLocked)));
    }

    #[test]
    fn file_store_tolerates_corrupt_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{not json").unwrap();

        let store = FileKeyValueStore::open(&path).unwrap();
        assert_eq!(store.get("anything").unwrap(), None);

        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v".to_string()));
    }

    #[test]
    fn remove_missing_key_does_not_rewrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        let store = FileKeyValueStore::open(&path).unwrap();
        store.remove("missing").unwrap();
        // Nothing was ever written, so the data file need not exist.
        assert_eq!(store.get("missing").unwrap(), None);
    }
}
