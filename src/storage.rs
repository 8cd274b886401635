//! Key-value storage backing persisted filter state
//!
//! Two backends share the [`KeyValueStore`] trait:
//! - [`MemoryStore`] - in-process map, optionally with a byte quota
//! - [`FileStore`] - one file per key under a directory
//!
//! # Directory Structure
//!
//! ```text
//! <data dir>/storage/
//!   quest-filters-default.json        # Value for key "quest-filters-default"
//!   quest-filters-default.json.lock   # fs2 lock guarding that entry
//! ```
//!
//! Keys are independent and last write wins.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::lock::{self, DEFAULT_LOCK_TIMEOUT_MS};

/// String key-value persistence, modelled on browser local storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &mut S {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

/// In-process store. Counts successful writes.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    quota_bytes: Option<usize>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects writes once keys plus values exceed `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            quota_bytes: Some(quota_bytes),
            ..Self::default()
        }
    }

    /// Seed an entry without counting it as a write.
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Number of successful `set` calls
    pub fn writes(&self) -> usize {
        self.writes
    }

    fn used_bytes_without(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|(existing, _)| existing.as_str() != key)
            .map(|(existing, value)| existing.len() + value.len())
            .sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if let Some(quota) = self.quota_bytes {
            let needed = self.used_bytes_without(key) + key.len() + value.len();
            if needed > quota {
                return Err(Error::OperationFailed(format!(
                    "storage quota exceeded ({needed} > {quota} bytes)"
                )));
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// File-backed store: each key is a file in `dir`, written atomically under a lock.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    timeout_ms: u64,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
        }
    }

    /// Store rooted at the platform data directory
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(default_storage_dir()?))
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `key`
    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_key(key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.entry_path(key);
        if !path.exists() {
            return Ok(None);
        }
        lock::read_locked_str(&path, self.timeout_ms).map(Some)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.entry_path(key);
        tracing::debug!(key, path = %path.display(), "writing store entry");
        lock::write_atomic_locked(&path, value.as_bytes(), self.timeout_ms)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        lock::remove_locked(self.entry_path(key), self.timeout_ms)
    }
}

/// `<platform data dir>/storage`
pub fn default_storage_dir() -> Result<PathBuf> {
    directories::ProjectDirs::from("com", "GoalsGuild", "ggq")
        .map(|dirs| dirs.data_dir().join("storage"))
        .ok_or_else(|| Error::OperationFailed("could not determine data directory".to_string()))
}

fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.') {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_counts_writes() {
        let mut store = MemoryStore::new();
        store.set("a", "1").unwrap();
        store.set("a", "2").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("2"));
        assert_eq!(store.writes(), 2);
        store.remove("a").unwrap();
        assert!(store.get("a").unwrap().is_none());
    }

    #[test]
    fn memory_store_enforces_quota() {
        let mut store = MemoryStore::with_quota(8);
        store.set("k", "1234").unwrap();
        let err = store.set("k", "123456789").expect_err("quota");
        assert!(matches!(err, Error::OperationFailed(_)));
        assert_eq!(store.get("k").unwrap().as_deref(), Some("1234"));
        assert_eq!(store.writes(), 1);
    }

    #[test]
    fn file_store_round_trips_and_removes() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path());
        assert!(store.get("quest-filters-default").unwrap().is_none());

        store.set("quest-filters-default", "{\"search\":\"run\"}").unwrap();
        assert_eq!(
            store.get("quest-filters-default").unwrap().as_deref(),
            Some("{\"search\":\"run\"}")
        );
        assert!(store.entry_path("quest-filters-default").exists());

        store.remove("quest-filters-default").unwrap();
        assert!(store.get("quest-filters-default").unwrap().is_none());
    }

    #[test]
    fn keys_are_sanitized_into_file_names() {
        let store = FileStore::new("/tmp/store");
        assert_eq!(
            store.entry_path("quest-filters-../etc"),
            PathBuf::from("/tmp/store/quest-filters-.._etc.json")
        );
    }
}
