//! Persistent key-value storage primitive.
//!
//! The cache treats storage the way a browser treats `localStorage`: a
//! synchronous string store that may throw on quota or serialization
//! problems. Implementations must be cheap enough to call on every
//! orchestrator run.

use crate::error::AnalyticsError;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

/// Synchronous, fallible string store.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, AnalyticsError>;
    fn set(&self, key: &str, value: &str) -> Result<(), AnalyticsError>;
    fn remove(&self, key: &str) -> Result<(), AnalyticsError>;
}

/// File-backed store: one JSON document per key under a directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, AnalyticsError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .map_err(|e| AnalyticsError::Storage(format!("create {}: {e}", dir.display())))?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys are internal constants, but sanitize anyway so a hostile key
        // cannot escape the store directory.
        let safe: String = key
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '_' || c == '.' { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, AnalyticsError> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AnalyticsError::Storage(format!(
                "read {}: {e}",
                path.display()
            ))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AnalyticsError> {
        let path = self.path_for(key);
        std::fs::write(&path, value)
            .map_err(|e| AnalyticsError::Storage(format!("write {}: {e}", path.display())))
    }

    fn remove(&self, key: &str) -> Result<(), AnalyticsError> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AnalyticsError::Storage(format!(
                "remove {}: {e}",
                path.display()
            ))),
        }
    }
}

/// In-memory store for tests and for running without persistence.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, AnalyticsError> {
        Ok(self.entries.lock().expect("store lock").get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AnalyticsError> {
        self.entries
            .lock()
            .expect("store lock")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), AnalyticsError> {
        self.entries.lock().expect("store lock").remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();

        assert_eq!(store.get("slot").unwrap(), None);
        store.set("slot", "{\"a\":1}").unwrap();
        assert_eq!(store.get("slot").unwrap().as_deref(), Some("{\"a\":1}"));
        store.remove("slot").unwrap();
        assert_eq!(store.get("slot").unwrap(), None);
        // Removing a missing key is not an error.
        store.remove("slot").unwrap();
    }

    #[test]
    fn file_store_sanitizes_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();
        store.set("../escape", "x").unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(entries, vec![".._escape.json"]);
    }

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryStore::new();
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }
}
