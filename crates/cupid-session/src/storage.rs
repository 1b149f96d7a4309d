//! Persisted string key/value storage backing the session store.
//!
//! Multi-key writes and reads go through a single lock so a reader sees
//! either all of a write or none of it.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub trait KeyValueStorage: Send + Sync {
    /// Snapshot of several keys taken under one lock.
    fn get_all(&self, keys: &[&str]) -> Result<Vec<Option<String>>>;

    fn set_all(&self, entries: &[(&str, &str)]) -> Result<()>;

    fn remove_all(&self, keys: &[&str]) -> Result<()>;

    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.get_all(&[key])?.pop().flatten())
    }
}

/// Process-local storage. Used by tests and by callers that do not want the
/// session to outlive the process.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_entries<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut HashMap<String, String>) -> T,
    {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| anyhow!("storage lock poisoned: {}", e))?;
        Ok(f(&mut entries))
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_all(&self, keys: &[&str]) -> Result<Vec<Option<String>>> {
        self.with_entries(|entries| keys.iter().map(|k| entries.get(*k).cloned()).collect())
    }

    fn set_all(&self, pairs: &[(&str, &str)]) -> Result<()> {
        self.with_entries(|entries| {
            for (key, value) in pairs {
                entries.insert((*key).to_string(), (*value).to_string());
            }
        })
    }

    fn remove_all(&self, keys: &[&str]) -> Result<()> {
        self.with_entries(|entries| {
            for key in keys {
                entries.remove(*key);
            }
        })
    }
}

/// Storage persisted as a flat JSON object in one file. Every write replaces
/// the whole file through a temp file + rename.
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn open(path: &Path) -> Result<Self> {
        let storage = Self {
            path: path.to_path_buf(),
            lock: Mutex::new(()),
        };

        match storage.load() {
            Ok(entries) => {
                info!("Session storage opened at {} ({} keys)", path.display(), entries.len())
            }
            // Reads fail (the session reads as signed out) until the next write
            // or clear replaces the file.
            Err(e) => warn!("Session storage at {} is unreadable: {:#}", path.display(), e),
        }
        Ok(storage)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<HashMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(HashMap::new()),
            Ok(raw) => serde_json::from_str(&raw)
                .with_context(|| format!("corrupt session storage at {}", self.path.display())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e).with_context(|| format!("cannot read {}", self.path.display())),
        }
    }

    fn store(&self, entries: &HashMap<String, String>) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("cannot create {}", dir.display()))?;
        }

        let tmp = self.path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        let json = serde_json::to_string_pretty(entries)?;
        fs::write(&tmp, json).with_context(|| format!("cannot write {}", tmp.display()))?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(e).with_context(|| format!("cannot replace {}", self.path.display()));
        }

        debug!("Session storage written ({} keys)", entries.len());
        Ok(())
    }

    fn modify<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut HashMap<String, String>),
    {
        let _guard = self.lock.lock().map_err(|e| anyhow!("storage lock poisoned: {}", e))?;
        let mut entries = self.load().unwrap_or_else(|e| {
            warn!("Discarding unreadable session storage: {:#}", e);
            HashMap::new()
        });
        f(&mut entries);
        self.store(&entries)
    }
}

impl KeyValueStorage for FileStorage {
    fn get_all(&self, keys: &[&str]) -> Result<Vec<Option<String>>> {
        let _guard = self.lock.lock().map_err(|e| anyhow!("storage lock poisoned: {}", e))?;
        let entries = self.load()?;
        Ok(keys.iter().map(|k| entries.get(*k).cloned()).collect())
    }

    fn set_all(&self, pairs: &[(&str, &str)]) -> Result<()> {
        self.modify(|entries| {
            for (key, value) in pairs {
                entries.insert((*key).to_string(), (*value).to_string());
            }
        })
    }

    fn remove_all(&self, keys: &[&str]) -> Result<()> {
        self.modify(|entries| {
            for key in keys {
                entries.remove(*key);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("cupid_storage_test_{}", Uuid::new_v4().simple()))
            .join(name)
    }

    #[test]
    fn memory_storage_set_get_remove() {
        let storage = MemoryStorage::new();
        storage.set_all(&[("a", "1"), ("b", "2")]).unwrap();
        assert_eq!(storage.get("a").unwrap().as_deref(), Some("1"));
        assert_eq!(
            storage.get_all(&["a", "b", "c"]).unwrap(),
            vec![Some("1".to_string()), Some("2".to_string()), None]
        );

        storage.remove_all(&["a"]).unwrap();
        assert_eq!(storage.get("a").unwrap(), None);
        assert_eq!(storage.get("b").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn file_storage_persists_across_reopen() {
        let path = temp_path("session.json");

        let storage = FileStorage::open(&path).unwrap();
        assert_eq!(storage.get("token").unwrap(), None);
        storage.set_all(&[("token", "abc"), ("user", "{}")]).unwrap();
        drop(storage);

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get("token").unwrap().as_deref(), Some("abc"));

        reopened.remove_all(&["token", "user"]).unwrap();
        assert_eq!(reopened.get_all(&["token", "user"]).unwrap(), vec![None, None]);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn corrupt_file_opens_and_is_replaced_by_next_write() {
        let path = temp_path("session.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{not json").unwrap();

        let storage = FileStorage::open(&path).unwrap();
        assert!(storage.get("token").is_err());

        storage.remove_all(&["token", "user"]).unwrap();
        assert_eq!(storage.get_all(&["token", "user"]).unwrap(), vec![None, None]);

        storage.set_all(&[("token", "abc")]).unwrap();
        assert_eq!(storage.get("token").unwrap().as_deref(), Some("abc"));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn write_replaces_file_without_leaving_temp_files() {
        let path = temp_path("session.json");
        let storage = FileStorage::open(&path).unwrap();

        storage.set_all(&[("token", "old"), ("user", "u1")]).unwrap();
        storage.set_all(&[("token", "new"), ("user", "u2")]).unwrap();

        let on_disk: HashMap<String, String> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk.get("token").map(String::as_str), Some("new"));
        assert_eq!(on_disk.get("user").map(String::as_str), Some("u2"));
        assert_eq!(on_disk.len(), 2);

        let dir = path.parent().unwrap();
        let names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["session.json".to_string()]);

        let _ = fs::remove_dir_all(dir);
    }
}
