//! Pluggable keyed storage.
//!
//! `KeyStore` is the seam between the vault and the host platform: a flat
//! map of short string records (base64 or JSON), synchronous, and durable
//! by the time a call returns. Two implementations ship here; hosts with
//! platform storage (keychain, browser storage) provide their own.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use parking_lot::RwLock;

use crate::error::StoreError;

pub trait KeyStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
    /// Remove every record. Called on sign-out.
    fn clear(&self) -> Result<(), StoreError>;
}

// ── In-memory store ───────────────────────────────────────────────────────────

/// Volatile store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryKeyStore {
    records: RwLock<HashMap<String, String>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyStore for MemoryKeyStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.records.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.records.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.records.write().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.records.write().clear();
        Ok(())
    }
}

// ── File-backed store ─────────────────────────────────────────────────────────

/// Single-file JSON store. Every mutation rewrites the file through a
/// sibling temp file and rename, so a crash mid-write leaves either the
/// old state or the new one, never a torn file.
pub struct FileKeyStore {
    path: PathBuf,
    records: RwLock<HashMap<String, String>>,
}

impl FileKeyStore {
    /// Open the store at `path`, creating an empty one if the file does
    /// not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let records = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                HashMap::new()
            } else {
                serde_json::from_str(&raw)?
            }
        } else {
            HashMap::new()
        };
        Ok(Self {
            path,
            records: RwLock::new(records),
        })
    }

    fn persist(&self, records: &HashMap<String, String>) -> Result<(), StoreError> {
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(records)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyStore for FileKeyStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.records.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut records = self.records.write();
        records.insert(key.to_string(), value.to_string());
        self.persist(&records)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut records = self.records.write();
        records.remove(key);
        self.persist(&records)
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut records = self.records.write();
        records.clear();
        self.persist(&records)
    }
}
