//! The refresh pipeline: discover, sort, fetch metadata, swap, persist.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::cache::{CacheState, CacheStore, CatalogSnapshot, MetadataEntry};
use crate::tmdb::{CatalogEntry, CatalogFetcher, QueryCombination};

use super::types::{RefreshError, RefreshSummary};

/// Rebuilds the cache from TMDB.
pub struct RefreshPipeline {
    fetcher: CatalogFetcher,
    combinations: Vec<QueryCombination>,
    store: Arc<CacheStore>,
}

impl RefreshPipeline {
    pub fn new(
        fetcher: CatalogFetcher,
        combinations: Vec<QueryCombination>,
        store: Arc<CacheStore>,
    ) -> Self {
        Self {
            fetcher,
            combinations,
            store,
        }
    }

    pub fn store(&self) -> &Arc<CacheStore> {
        &self.store
    }

    /// Run a full refresh stamped with the current time.
    pub async fn run(&self) -> Result<RefreshSummary, RefreshError> {
        self.run_at(Utc::now()).await
    }

    /// Run a full refresh stamped with `now`.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<RefreshSummary, RefreshError> {
        let started = Instant::now();
        info!(
            "Starting catalog refresh across {} combinations",
            self.combinations.len()
        );

        // 1. Discover every combination in order. Entries matching several
        //    combinations are kept once per combination.
        let mut entries: Vec<CatalogEntry> = Vec::new();
        for combination in &self.combinations {
            let found = self.fetcher.fetch_combination(combination).await;
            debug!("{} -> {} entries", combination, found.len());
            entries.extend(found);
        }

        let previous = self.store.current();
        if entries.is_empty() && !previous.catalog.is_empty() {
            return Err(RefreshError::EmptyCatalog {
                previous_entries: previous.catalog.len(),
            });
        }

        // 2. Most recent first; `sort_by` is stable so ties keep fetch order.
        sort_by_release_desc(&mut entries);

        // 3. New snapshot.
        let catalog = CatalogSnapshot::new(now, entries);

        // 4. Metadata, merged into a copy of the current table.
        let mut metadata = previous.metadata.clone();
        let mut metadata_failed = 0;
        for entry in &catalog.entries {
            let record = self.fetcher.fetch_item_metadata(entry.id).await;
            if record.is_failed() {
                metadata_failed += 1;
            }
            metadata.insert(
                entry.id,
                MetadataEntry {
                    fetched_at: now,
                    record,
                },
            );
        }

        let catalog_entries = catalog.len();
        let metadata_entries = metadata.len();

        // 5. Swap, then persist. A failed write leaves the new state served.
        self.store.replace(CacheState { catalog, metadata });

        let persisted = match self.store.persist() {
            Ok(persisted) => persisted,
            Err(e) => {
                warn!("Failed to persist cache, serving in-memory state: {}", e);
                false
            }
        };

        let summary = RefreshSummary {
            fetched_at: now,
            catalog_entries,
            metadata_fetched: catalog_entries - metadata_failed,
            metadata_failed,
            metadata_entries,
            persisted,
            duration_ms: started.elapsed().as_millis() as u64,
        };

        info!(
            "Catalog refresh complete: {} entries, {} metadata failures, {} ms",
            summary.catalog_entries, summary.metadata_failed, summary.duration_ms
        );

        Ok(summary)
    }
}

/// Stable sort, most recent release first.
pub fn sort_by_release_desc(entries: &mut [CatalogEntry]) {
    entries.sort_by(|a, b| b.release_date.cmp(&a.release_date));
}
