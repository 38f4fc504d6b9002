//! Durable key/value storage for user preferences.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::StorageError;

/// String key/value persistence. Keys are independent; writers never
/// assume exclusive ownership of the store.
pub trait Storage: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Volatile store, used in tests and when the file store is unusable.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// A flat JSON object on disk. Every write rewrites the whole file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Open the store, creating nothing until the first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|source| StorageError::Corrupt {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StorageError::Io { path, source }),
        };
        debug!(path = %path.display(), "storage opened");
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let raw = serde_json::to_string_pretty(&self.entries).map_err(|source| StorageError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, raw).map_err(io_err)
    }
}

impl Storage for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }
}

/// Open the file store at `path`, or fall back to memory with a warning.
pub fn open_storage(path: Option<PathBuf>) -> Box<dyn Storage> {
    let Some(path) = path else {
        warn!("no storage location available, preferences will not persist");
        return Box::new(MemoryStore::new());
    };
    match JsonFileStore::open(&path) {
        Ok(store) => Box::new(store),
        Err(e) => {
            warn!(error = %e, "storage unavailable, preferences will not persist");
            Box::new(MemoryStore::new())
        }
    }
}

/// Read a `"true"`/`"false"` flag. Anything else reads as unset.
pub fn get_flag(storage: &dyn Storage, key: &str) -> Option<bool> {
    match storage.get(key)?.as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

pub fn set_flag(storage: &mut dyn Storage, key: &str, value: bool) -> Result<(), StorageError> {
    storage.set(key, if value { "true" } else { "false" })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("site_theme"), None);
        store.set("site_theme", "light").unwrap();
        assert_eq!(store.get("site_theme").as_deref(), Some("light"));
    }

    #[test]
    fn test_file_store_persists_across_opens() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("storage.json");

        let mut store = JsonFileStore::open(&path).unwrap();
        store.set("site_theme", "light").unwrap();
        store.set("font-large", "true").unwrap();

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get("site_theme").as_deref(), Some("light"));
        assert_eq!(reopened.get("font-large").as_deref(), Some("true"));
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("storage.json");
        fs::write(&path, "not json").unwrap();

        assert!(matches!(JsonFileStore::open(&path), Err(StorageError::Corrupt { .. })));

        // The session still gets a working store
        let mut fallback = open_storage(Some(path));
        fallback.set("a", "b").unwrap();
        assert_eq!(fallback.get("a").as_deref(), Some("b"));
    }

    #[test]
    fn test_flags() {
        let mut store = MemoryStore::new();
        assert_eq!(get_flag(&store, "reduce-motion"), None);
        set_flag(&mut store, "reduce-motion", true).unwrap();
        assert_eq!(get_flag(&store, "reduce-motion"), Some(true));
        store.set("reduce-motion", "yes").unwrap();
        assert_eq!(get_flag(&store, "reduce-motion"), None);
    }
}
