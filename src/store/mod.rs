//! Persistent store - durable key/value records.
//!
//! The store is the only component that performs I/O for the configuration
//! collection. It is split in two layers:
//!
//! - [`KeyValueStore`]: raw byte records keyed by string ([`FileStore`] on disk,
//!   [`MemoryStore`] for tests and ephemeral sessions)
//! - [`ConfigStore`]: the typed view the registry uses, exposing only
//!   [`load`](ConfigStore::load) and [`persist`](ConfigStore::persist) of the
//!   full collection under [`CONFIG_KEY`]
//!
//! Every write replaces the whole record; there are no partial updates.

use crate::models::EmulatorConfig;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

/// Key of the record holding the configuration collection.
pub const CONFIG_KEY: &str = "emusak-config";

/// Errors raised by the persistent store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid record key: {0:?}")]
    InvalidKey(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed record {key}: {message}")]
    Malformed { key: String, message: String },

    #[error("Failed to serialize record {key}: {message}")]
    Serialize { key: String, message: String },

    #[error("Store rejected write to {0}")]
    WriteRejected(String),
}

/// Durable byte-string records keyed by string.
pub trait KeyValueStore {
    /// Read a record. `Ok(None)` when the key has never been written.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replace a record with `value`.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;
}

/// Directory-backed store: one `<key>.yaml` file per record.
///
/// Writes go to a temp file in the same directory which is synced and then
/// renamed over the record, so readers see either the old or the new bytes.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: Utf8PathBuf,
}

impl FileStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open<P: AsRef<Utf8Path>>(root: P) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        if !root.exists() {
            fs::create_dir_all(&root).map_err(|source| StoreError::Io {
                path: root.clone(),
                source,
            })?;
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// File backing `key`.
    pub fn record_path(&self, key: &str) -> Result<Utf8PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
            && !key.starts_with('.');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{key}.yaml")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.record_path(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let path = self.record_path(key)?;
        let temp_path = self
            .root
            .join(format!(".{key}.{}.tmp", std::process::id()));

        let io_err = |path: &Utf8Path| {
            let path = path.to_path_buf();
            move |source| StoreError::Io { path, source }
        };

        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .map_err(io_err(&temp_path))?;
            file.write_all(value).map_err(io_err(&temp_path))?;
            file.sync_all().map_err(io_err(&temp_path))?;
        }

        if let Err(e) = fs::rename(&temp_path, &path) {
            let _ = fs::remove_file(&temp_path);
            return Err(StoreError::Io { path, source: e });
        }

        tracing::debug!("Wrote record {} ({} bytes)", path, value.len());
        Ok(())
    }
}

/// In-memory store. Clones share the same records.
///
/// [`set_fail_writes`](Self::set_fail_writes) makes every subsequent write fail,
/// which lets callers exercise the no-partial-mutation guarantees.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-seeded with one record.
    pub fn with_record(key: &str, value: impl Into<Vec<u8>>) -> Self {
        let store = Self::new();
        store
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.into());
        store
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(records.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::WriteRejected(key.to_string()));
        }
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        records.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

/// Typed access to the configuration record.
///
/// The registry never touches raw storage; it only loads and persists whole
/// collections through this type.
#[derive(Debug, Clone)]
pub struct ConfigStore<S> {
    backend: S,
}

impl<S: KeyValueStore> ConfigStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    /// Read the collection.
    ///
    /// `Ok(None)` when nothing has been persisted yet; [`StoreError::Malformed`]
    /// when the record exists but does not parse.
    pub fn load(&self) -> Result<Option<Vec<EmulatorConfig>>, StoreError> {
        let Some(bytes) = self.backend.get(CONFIG_KEY)? else {
            return Ok(None);
        };

        let malformed = |message: String| StoreError::Malformed {
            key: CONFIG_KEY.to_string(),
            message,
        };

        let text = std::str::from_utf8(&bytes).map_err(|e| malformed(e.to_string()))?;
        if text.trim().is_empty() {
            return Err(malformed("record is empty".to_string()));
        }

        let configs: Vec<EmulatorConfig> =
            serde_yaml_ng::from_str(text).map_err(|e| malformed(e.to_string()))?;
        Ok(Some(configs))
    }

    /// Overwrite the record with `configs`, in order.
    pub fn persist(&self, configs: &[EmulatorConfig]) -> Result<(), StoreError> {
        let yaml = serde_yaml_ng::to_string(configs).map_err(|e| StoreError::Serialize {
            key: CONFIG_KEY.to_string(),
            message: e.to_string(),
        })?;
        self.backend.set(CONFIG_KEY, yaml.as_bytes())
    }

    /// Raw bytes of the record, for diagnostics and byte-level comparisons.
    pub fn raw(&self) -> Result<Option<Vec<u8>>, StoreError> {
        self.backend.get(CONFIG_KEY)
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }
}
