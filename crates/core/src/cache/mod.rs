//! Local cache of the TMDB catalog and per-movie metadata.
//!
//! [`CacheStore`] holds the live [`CacheState`] behind a single `Arc`.
//! Readers take a clone of that `Arc` and never observe a half-applied
//! refresh; the refresh pipeline builds a complete new state and swaps the
//! pointer. [`SnapshotStorage`] mirrors the state to disk on a best-effort
//! basis: the in-memory copy is authoritative.

mod storage;
mod types;

pub use storage::SnapshotStorage;
pub use types::*;

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reading or writing cache snapshots.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid cache file {path:?}: {source}")]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Directory holding catalog.json and metadata.json.
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,
    /// Age after which a loaded snapshot triggers an immediate refresh.
    #[serde(default = "default_staleness_hours")]
    pub staleness_hours: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
            staleness_hours: default_staleness_hours(),
        }
    }
}

impl CacheConfig {
    pub fn staleness(&self) -> chrono::Duration {
        chrono::Duration::hours(self.staleness_hours as i64)
    }
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("cache")
}

fn default_staleness_hours() -> u32 {
    24
}

/// Shared owner of the live cache state.
pub struct CacheStore {
    state: RwLock<Arc<CacheState>>,
    storage: Option<SnapshotStorage>,
}

impl CacheStore {
    /// Open a store backed by `storage`, loading whatever it holds.
    pub fn open(storage: SnapshotStorage) -> Self {
        let state = storage.load();
        Self {
            state: RwLock::new(Arc::new(state)),
            storage: Some(storage),
        }
    }

    /// Create an empty store with no durable storage (useful for testing).
    pub fn in_memory() -> Self {
        Self::with_state(CacheState::empty())
    }

    /// Create a store with no durable storage holding `state`.
    pub fn with_state(state: CacheState) -> Self {
        Self {
            state: RwLock::new(Arc::new(state)),
            storage: None,
        }
    }

    /// The live state. Never a partially updated pair.
    pub fn current(&self) -> Arc<CacheState> {
        let guard = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Swap in a new state, returning the previous one.
    pub fn replace(&self, state: CacheState) -> Arc<CacheState> {
        let next = Arc::new(state);
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, next)
    }

    /// Write the current state to durable storage.
    ///
    /// Returns `Ok(false)` when the store has no storage attached.
    pub fn persist(&self) -> Result<bool, StorageError> {
        let Some(storage) = &self.storage else {
            return Ok(false);
        };
        storage.save(&self.current())?;
        Ok(true)
    }

    /// True when the catalog was never fetched or is older than `threshold`.
    pub fn is_stale(&self, now: DateTime<Utc>, threshold: chrono::Duration) -> bool {
        self.current().catalog.is_stale(now, threshold)
    }

    pub fn stats(&self) -> CacheStats {
        self.current().stats()
    }

    pub fn storage(&self) -> Option<&SnapshotStorage> {
        self.storage.as_ref()
    }
}
