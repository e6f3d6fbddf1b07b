#![forbid(unsafe_code)]

//! Durable layout records.
//!
//! A [`LayoutStore`] holds one [`LayoutState`] per page-context key. Stores
//! are synchronous; the executors in [`crate::executor`] run them off the
//! interaction path.
//!
//! # Backends
//!
//! - [`MemoryStore`]: a shared map of serialized records. Clones share the
//!   same map, so a second clone behaves like a second page instance reading
//!   the same browser storage. Load and save failures can be injected.
//! - [`FileStore`]: one pretty-printed JSON file per key.
//!
//! # Atomic Writes
//!
//! [`FileStore`] writes to a temp file and renames it over the record, so a
//! crash mid-write leaves the previous record intact.
//!
//! # Failure Modes
//!
//! - Missing record: `Ok(None)`, not an error.
//! - Corrupted record: [`StoreError::Json`].
//! - There is no locking. Concurrent writers race and the last write wins.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashgrid_layout::LayoutState;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::config::is_valid_storage_key;

/// Errors surfaced by store backends and executors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid storage key: {key:?}")]
    InvalidKey { key: String },

    #[error("storage unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("store worker has shut down")]
    WorkerGone,
}

/// Key-value persistence for layout records.
pub trait LayoutStore: Send {
    /// Read the record for `key`. A missing record is `Ok(None)`.
    fn load(&mut self, key: &str) -> Result<Option<LayoutState>, StoreError>;

    /// Replace the record for `key`.
    fn save(&mut self, key: &str, state: &LayoutState) -> Result<(), StoreError>;
}

impl<S: LayoutStore + ?Sized> LayoutStore for Box<S> {
    fn load(&mut self, key: &str) -> Result<Option<LayoutState>, StoreError> {
        (**self).load(key)
    }

    fn save(&mut self, key: &str, state: &LayoutState) -> Result<(), StoreError> {
        (**self).save(key, state)
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct MemoryRecords {
    records: FxHashMap<String, String>,
    fail_loads: bool,
    fail_saves: bool,
    loads: u64,
    saves: u64,
}

/// In-process store. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryRecords>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record without going through [`LayoutStore::save`].
    pub fn seed(&self, key: &str, state: &LayoutState) -> Result<(), StoreError> {
        let raw = serde_json::to_string(state)?;
        self.lock().records.insert(key.to_owned(), raw);
        Ok(())
    }

    /// Store raw text, which need not be valid JSON.
    pub fn seed_raw(&self, key: &str, raw: impl Into<String>) {
        self.lock().records.insert(key.to_owned(), raw.into());
    }

    /// Raw text stored under `key`.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.lock().records.get(key).cloned()
    }

    /// Parsed record under `key`, if present and valid.
    #[must_use]
    pub fn record(&self, key: &str) -> Option<LayoutState> {
        self.raw(key).and_then(|raw| serde_json::from_str(&raw).ok())
    }

    /// Make every subsequent load fail.
    pub fn fail_loads(&self, fail: bool) {
        self.lock().fail_loads = fail;
    }

    /// Make every subsequent save fail.
    pub fn fail_saves(&self, fail: bool) {
        self.lock().fail_saves = fail;
    }

    /// Loads attempted so far, including failed ones.
    #[must_use]
    pub fn load_count(&self) -> u64 {
        self.lock().loads
    }

    /// Saves attempted so far, including failed ones.
    #[must_use]
    pub fn save_count(&self) -> u64 {
        self.lock().saves
    }

    fn lock(&self) -> MutexGuard<'_, MemoryRecords> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LayoutStore for MemoryStore {
    fn load(&mut self, key: &str) -> Result<Option<LayoutState>, StoreError> {
        let raw = {
            let mut inner = self.lock();
            inner.loads += 1;
            if inner.fail_loads {
                return Err(StoreError::Unavailable {
                    reason: "load failure injected".to_owned(),
                });
            }
            inner.records.get(key).cloned()
        };
        raw.map(|raw| serde_json::from_str(&raw))
            .transpose()
            .map_err(StoreError::from)
    }

    fn save(&mut self, key: &str, state: &LayoutState) -> Result<(), StoreError> {
        let raw = serde_json::to_string(state)?;
        let mut inner = self.lock();
        inner.saves += 1;
        if inner.fail_saves {
            return Err(StoreError::Unavailable {
                reason: "save failure injected".to_owned(),
            });
        }
        inner.records.insert(key.to_owned(), raw);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

/// One JSON file per key under a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Store records under `dir`. The directory is created on first save.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the record for `key`.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        if !is_valid_storage_key(key) {
            return Err(StoreError::InvalidKey {
                key: key.to_owned(),
            });
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl LayoutStore for FileStore {
    fn load(&mut self, key: &str) -> Result<Option<LayoutState>, StoreError> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn save(&mut self, key: &str, state: &LayoutState) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(state)?;

        let temp = path.with_extension("json.tmp");
        std::fs::write(&temp, json)?;
        std::fs::rename(&temp, &path)?;
        Ok(())
    }
}
