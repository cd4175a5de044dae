use std::{
    collections::BTreeMap,
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use parking_lot::RwLock;
use tempfile::NamedTempFile;
use tracing::debug;

use super::{KeyValueStore, PersistenceError};

/// File name used for the storage document inside the data directory.
pub const STORAGE_FILE: &str = "storage.json";

/// Key-value store persisted as one JSON object on disk.
///
/// Every write replaces the whole document through a temporary file that is
/// renamed over the previous one, so a reader sees either the old or the new
/// contents and never a partial write. The in-memory copy only changes after
/// the rename succeeds.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open (or lazily create) the store inside `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|source| PersistenceError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let path = dir.join(STORAGE_FILE);
        let entries = read_document(&path)?;
        debug!(path = %path.display(), keys = entries.len(), "Storage opened");
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Location of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn commit(
        &self,
        apply: impl FnOnce(&mut BTreeMap<String, String>),
    ) -> Result<(), PersistenceError> {
        let mut entries = self.entries.write();
        let mut next = entries.clone();
        apply(&mut next);
        write_document(&self.path, &next)?;
        *entries = next;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.commit(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        if !self.entries.read().contains_key(key) {
            return Ok(());
        }
        self.commit(|entries| {
            entries.remove(key);
        })
    }

    fn set_many(&self, batch: &[(&str, String)]) -> Result<(), PersistenceError> {
        self.commit(|entries| {
            for (key, value) in batch {
                entries.insert((*key).to_string(), value.clone());
            }
        })
    }
}

fn read_document(path: &Path) -> Result<BTreeMap<String, String>, PersistenceError> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }

    let contents = fs::read_to_string(path).map_err(|source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if contents.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_str(&contents).map_err(|err| PersistenceError::Corrupt {
        key: path.display().to_string(),
        reason: err.to_string(),
    })
}

fn write_document(path: &Path, entries: &BTreeMap<String, String>) -> Result<(), PersistenceError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let io_err = |source: std::io::Error| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    };

    let serialized = serde_json::to_vec_pretty(entries).map_err(|source| {
        PersistenceError::Encode {
            key: path.display().to_string(),
            source,
        }
    })?;

    let mut staging = NamedTempFile::new_in(dir).map_err(io_err)?;
    staging.write_all(&serialized).map_err(io_err)?;
    staging.as_file().sync_all().map_err(io_err)?;
    staging.persist(path).map_err(|err| io_err(err.error))?;
    Ok(())
}
