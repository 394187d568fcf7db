//! # bz-store-file
//! rusty-bazaar/crates/bz-plugins/bz-store-file/src/lib.rs
//! JSON-file implementation of `KeyValueStore`.
//! The whole map is held in memory and rewritten on every change, so a new
//! process over the same file sees the same session.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use bz_core::traits::KeyValueStore;
use bz_core::StoreError;
use dashmap::DashMap;

pub struct FileStore {
    /// Location of the JSON document (e.g., ".bazaar/session.json")
    path: PathBuf,
    entries: DashMap<String, String>,
    /// Serializes snapshot, write and rename; all flushes share one temp path.
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Opens the store, reading existing entries. A missing file is an
    /// empty store; it is created on the first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let mut entries = DashMap::new();
        match fs::read(&path) {
            Ok(bytes) if !bytes.is_empty() => {
                let map: BTreeMap<String, String> = serde_json::from_slice(&bytes)?;
                entries.extend(map);
            }
            Ok(_) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
        tracing::debug!(path = %path.display(), entries = entries.len(), "file store opened");
        Ok(Self {
            path,
            entries,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes to a sibling temp file and renames it over the target so a
    /// crash never leaves a half-written document.
    fn flush(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let snapshot: BTreeMap<String, String> = self
            .entries
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        let bytes = serde_json::to_vec_pretty(&snapshot)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|v| v.value().clone())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        if self.entries.remove(key).is_none() {
            return Ok(());
        }
        self.flush()
    }
}
