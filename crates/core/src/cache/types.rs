//! Types for the local catalog/metadata cache.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tmdb::{CatalogEntry, MetadataRecord};

/// The full catalog as of one refresh.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    /// When the snapshot was built. `None` means never fetched.
    #[serde(default)]
    pub fetched_at: Option<DateTime<Utc>>,
    /// Entries, most recent release first.
    #[serde(default)]
    pub entries: Vec<CatalogEntry>,
}

impl CatalogSnapshot {
    pub fn new(fetched_at: DateTime<Utc>, entries: Vec<CatalogEntry>) -> Self {
        Self {
            fetched_at: Some(fetched_at),
            entries,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when never fetched or fetched more than `threshold` before `now`.
    pub fn is_stale(&self, now: DateTime<Utc>, threshold: chrono::Duration) -> bool {
        match self.fetched_at {
            None => true,
            Some(fetched_at) => now - fetched_at > threshold,
        }
    }
}

/// One metadata table row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub fetched_at: DateTime<Utc>,
    pub record: MetadataRecord,
}

/// Metadata keyed by TMDB id.
///
/// Refreshes merge into the table; rows for movies that dropped out of the
/// catalog are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataTable {
    entries: HashMap<u32, MetadataEntry>,
}

impl MetadataTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tmdb_id: u32) -> Option<&MetadataEntry> {
        self.entries.get(&tmdb_id)
    }

    /// Insert or overwrite a row.
    pub fn insert(&mut self, tmdb_id: u32, entry: MetadataEntry) {
        self.entries.insert(tmdb_id, entry);
    }

    pub fn contains(&self, tmdb_id: u32) -> bool {
        self.entries.contains_key(&tmdb_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of rows holding a failure marker.
    pub fn failed_count(&self) -> usize {
        self.entries
            .values()
            .filter(|e| e.record.is_failed())
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&u32, &MetadataEntry)> {
        self.entries.iter()
    }
}

/// The catalog snapshot and metadata table, swapped as one unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheState {
    pub catalog: CatalogSnapshot,
    pub metadata: MetadataTable,
}

impl CacheState {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            fetched_at: self.catalog.fetched_at,
            catalog_entries: self.catalog.len(),
            metadata_entries: self.metadata.len(),
            metadata_failures: self.metadata.failed_count(),
        }
    }
}

/// Cache statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetched_at: Option<DateTime<Utc>>,
    pub catalog_entries: usize,
    pub metadata_entries: usize,
    pub metadata_failures: usize,
}
