//! Whole-file JSON snapshots of the cache.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::types::{CacheState, CatalogSnapshot, MetadataTable};
use super::StorageError;

const CATALOG_FILE: &str = "catalog.json";
const METADATA_FILE: &str = "metadata.json";

/// Durable storage for the catalog snapshot and metadata table.
#[derive(Debug, Clone)]
pub struct SnapshotStorage {
    dir: PathBuf,
}

impl SnapshotStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.dir.join(CATALOG_FILE)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.dir.join(METADATA_FILE)
    }

    /// Load both files.
    ///
    /// Each file is loaded independently; a missing or unreadable file yields
    /// the empty value for that half.
    pub fn load(&self) -> CacheState {
        let catalog: CatalogSnapshot = load_or_default(&self.catalog_path());
        let metadata: MetadataTable = load_or_default(&self.metadata_path());

        info!(
            "Loaded cache from {:?}: {} catalog entries, {} metadata entries",
            self.dir,
            catalog.len(),
            metadata.len()
        );

        CacheState { catalog, metadata }
    }

    /// Write both files.
    ///
    /// Both snapshots are staged to temp files first and only renamed into
    /// place once both are written, so a failed write leaves the previous
    /// pair untouched. The two renames are separate steps: a crash between
    /// them can pair a new catalog with the previous metadata table, which
    /// the read path tolerates.
    pub fn save(&self, state: &CacheState) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(|e| StorageError::io(&self.dir, e))?;

        let catalog_path = self.catalog_path();
        let metadata_path = self.metadata_path();

        let catalog_tmp = stage_json(&catalog_path, &state.catalog)?;
        let metadata_tmp = match stage_json(&metadata_path, &state.metadata) {
            Ok(tmp) => tmp,
            Err(e) => {
                let _ = fs::remove_file(&catalog_tmp);
                return Err(e);
            }
        };

        if let Err(e) = commit(&catalog_tmp, &catalog_path) {
            let _ = fs::remove_file(&metadata_tmp);
            return Err(e);
        }
        commit(&metadata_tmp, &metadata_path)?;

        debug!("Saved cache snapshots to {:?}", self.dir);
        Ok(())
    }
}

fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    match read_json(path) {
        Ok(Some(value)) => value,
        Ok(None) => {
            debug!("No cache file at {:?}, starting empty", path);
            T::default()
        }
        Err(e) => {
            warn!("Ignoring unreadable cache file: {}", e);
            T::default()
        }
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StorageError::io(path, e)),
    };

    serde_json::from_slice(&data)
        .map(Some)
        .map_err(|e| StorageError::Serialization {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Serialize `value` next to `path` and return the temp file path.
fn stage_json<T: Serialize>(path: &Path, value: &T) -> Result<PathBuf, StorageError> {
    let data = serde_json::to_vec(value).map_err(|e| StorageError::Serialization {
        path: path.to_path_buf(),
        source: e,
    })?;

    let tmp = path.with_extension("json.tmp");
    if let Err(e) = fs::write(&tmp, data) {
        let _ = fs::remove_file(&tmp);
        return Err(StorageError::io(&tmp, e));
    }

    Ok(tmp)
}

fn commit(tmp: &Path, path: &Path) -> Result<(), StorageError> {
    if let Err(e) = fs::rename(tmp, path) {
        let _ = fs::remove_file(tmp);
        return Err(StorageError::io(path, e));
    }
    Ok(())
}
