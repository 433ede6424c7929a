//! Paginated catalog discovery and per-item metadata lookups.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::types::{
    CatalogEntry, DiscoverFilters, MetadataRecord, PageResult, QueryCombination,
};
use super::{FetchError, MetadataSource};

/// Discovery configuration: shared filters, page cap and the fixed
/// combination list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoverConfig {
    #[serde(flatten)]
    pub filters: DiscoverFilters,
    /// Maximum number of pages fetched per combination (default: 5)
    #[serde(default = "default_page_cap")]
    pub page_cap: u32,
    /// Genre combinations, fetched in order.
    #[serde(default = "default_combinations")]
    pub combinations: Vec<QueryCombination>,
}

impl Default for DiscoverConfig {
    fn default() -> Self {
        Self {
            filters: DiscoverFilters::default(),
            page_cap: default_page_cap(),
            combinations: default_combinations(),
        }
    }
}

fn default_page_cap() -> u32 {
    5
}

fn default_combinations() -> Vec<QueryCombination> {
    vec![QueryCombination::default()]
}

/// Stateless wrapper around a [`MetadataSource`] that applies the discover
/// filters and page cap.
#[derive(Clone)]
pub struct CatalogFetcher {
    source: Arc<dyn MetadataSource>,
    filters: DiscoverFilters,
    page_cap: u32,
}

impl CatalogFetcher {
    pub fn new(source: Arc<dyn MetadataSource>, filters: DiscoverFilters, page_cap: u32) -> Self {
        Self {
            source,
            filters,
            page_cap,
        }
    }

    pub fn from_config(source: Arc<dyn MetadataSource>, config: &DiscoverConfig) -> Self {
        Self::new(source, config.filters.clone(), config.page_cap)
    }

    pub fn page_cap(&self) -> u32 {
        self.page_cap
    }

    /// Fetch one page and keep only entries with a usable release date.
    pub async fn fetch_page(
        &self,
        query: &QueryCombination,
        page: u32,
    ) -> Result<PageResult, FetchError> {
        let raw = self.source.discover(&self.filters, query, page).await?;

        let received = raw.results.len();
        let entries: Vec<CatalogEntry> = raw
            .results
            .into_iter()
            .filter_map(CatalogEntry::from_discovered)
            .collect();

        if entries.len() < received {
            debug!(
                "Dropped {} of {} results without a valid release date ({}, page {})",
                received - entries.len(),
                received,
                query,
                page
            );
        }

        Ok(PageResult {
            entries,
            total_pages: raw.total_pages,
        })
    }

    /// Page through one combination.
    ///
    /// Stops at the page cap, at the last page, or at the first failed page.
    /// Entries from pages fetched before a failure are kept.
    pub async fn fetch_combination(&self, query: &QueryCombination) -> Vec<CatalogEntry> {
        let mut gathered = Vec::new();
        let mut page = 1;
        // Unknown until the first response arrives.
        let mut total_pages = 1;

        while page <= self.page_cap && page <= total_pages {
            match self.fetch_page(query, page).await {
                Ok(result) => {
                    total_pages = result.total_pages;
                    gathered.extend(result.entries);
                }
                Err(e) => {
                    warn!(
                        "Discover failed for {} on page {}, keeping {} entries: {}",
                        query,
                        page,
                        gathered.len(),
                        e
                    );
                    break;
                }
            }
            page += 1;
        }

        debug!("Fetched {} entries for {}", gathered.len(), query);
        gathered
    }

    /// Look up one movie. Failures become [`MetadataRecord::Failed`].
    pub async fn fetch_item_metadata(&self, tmdb_id: u32) -> MetadataRecord {
        match self.source.movie_details(tmdb_id).await {
            Ok(details) => MetadataRecord::Fetched(details),
            Err(e) => {
                warn!("Metadata fetch failed for movie {}: {}", tmdb_id, e);
                MetadataRecord::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}
