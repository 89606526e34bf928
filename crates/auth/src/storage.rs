//! Durable key/value storage backing the session store.
//!
//! Records are whole serialized strings stored under fixed keys. A save
//! either replaces the previous record completely or leaves it untouched.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use anyhow::{Context, anyhow};

/// Key of the serialized current session.
pub const SESSION_KEY: &str = "gestio.session";

/// Key of the administrator override credentials.
pub const ADMIN_CREDENTIALS_KEY: &str = "gestio.admin_credentials";

/// Storage abstraction for persisted engine records.
pub trait SessionStorage: Send + Sync {
    /// Load a record; `Ok(None)` when nothing is stored under `key`.
    fn load(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn save(&self, key: &str, value: &str) -> anyhow::Result<()>;
    /// Remove a record. Removing an absent key succeeds.
    fn remove(&self, key: &str) -> anyhow::Result<()>;
}

impl<S> SessionStorage for Arc<S>
where
    S: SessionStorage + ?Sized,
{
    fn load(&self, key: &str) -> anyhow::Result<Option<String>> {
        (**self).load(key)
    }

    fn save(&self, key: &str, value: &str) -> anyhow::Result<()> {
        (**self).save(key, value)
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        (**self).remove(key)
    }
}

impl<S> SessionStorage for Box<S>
where
    S: SessionStorage + ?Sized,
{
    fn load(&self, key: &str) -> anyhow::Result<Option<String>> {
        (**self).load(key)
    }

    fn save(&self, key: &str, value: &str) -> anyhow::Result<()> {
        (**self).save(key, value)
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        (**self).remove(key)
    }
}

/// In-memory storage for tests/dev. Share it through an `Arc` to simulate
/// a process restart against the same records.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    inner: RwLock<HashMap<String, String>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for InMemoryStorage {
    fn load(&self, key: &str) -> anyhow::Result<Option<String>> {
        let map = self.inner.read().map_err(|_| anyhow!("storage lock poisoned"))?;
        Ok(map.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut map = self.inner.write().map_err(|_| anyhow!("storage lock poisoned"))?;
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        let mut map = self.inner.write().map_err(|_| anyhow!("storage lock poisoned"))?;
        map.remove(key);
        Ok(())
    }
}

/// File-backed storage: one `<key>.json` file per record inside `dir`.
///
/// Writes go to a sibling temp file which is then renamed over the record,
/// so readers never observe a torn write.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!(".{key}.json.tmp"))
    }
}

impl SessionStorage for FileStorage {
    fn load(&self, key: &str) -> anyhow::Result<Option<String>> {
        let path = self.record_path(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("failed to read record at {:?}", path)),
        }
    }

    fn save(&self, key: &str, value: &str) -> anyhow::Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create storage directory at {:?}", self.dir))?;

        let temp = self.temp_path(key);
        let mut file = fs::File::create(&temp)
            .with_context(|| format!("failed to create temp record at {:?}", temp))?;
        file.write_all(value.as_bytes())
            .and_then(|_| file.sync_all())
            .with_context(|| format!("failed to write temp record at {:?}", temp))?;
        drop(file);

        let path = self.record_path(key);
        if let Err(err) = fs::rename(&temp, &path) {
            let _ = fs::remove_file(&temp);
            return Err(err).with_context(|| format!("failed to replace record at {:?}", path));
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        let path = self.record_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| format!("failed to remove record at {:?}", path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_round_trip() {
        let storage = InMemoryStorage::new();
        assert_eq!(storage.load(SESSION_KEY).unwrap(), None);

        storage.save(SESSION_KEY, "{}").unwrap();
        assert_eq!(storage.load(SESSION_KEY).unwrap().as_deref(), Some("{}"));

        storage.remove(SESSION_KEY).unwrap();
        storage.remove(SESSION_KEY).unwrap();
        assert_eq!(storage.load(SESSION_KEY).unwrap(), None);
    }

    #[test]
    fn file_storage_replaces_records_whole() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested"));

        assert_eq!(storage.load(SESSION_KEY).unwrap(), None);

        storage.save(SESSION_KEY, "first record, fairly long").unwrap();
        storage.save(SESSION_KEY, "second").unwrap();
        assert_eq!(storage.load(SESSION_KEY).unwrap().as_deref(), Some("second"));

        // No temp files left behind.
        let leftovers: Vec<_> = fs::read_dir(storage.dir())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn file_storage_keys_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        storage.save(SESSION_KEY, "session").unwrap();
        storage.save(ADMIN_CREDENTIALS_KEY, "creds").unwrap();
        storage.remove(SESSION_KEY).unwrap();

        assert_eq!(storage.load(SESSION_KEY).unwrap(), None);
        assert_eq!(storage.load(ADMIN_CREDENTIALS_KEY).unwrap().as_deref(), Some("creds"));
    }
}
