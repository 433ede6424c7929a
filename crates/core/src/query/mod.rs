//! Read path: catalog search and metadata lookups served from the cache.
//!
//! Nothing here touches the network. Every call works on one
//! [`CacheState`](crate::cache::CacheState) taken from the store, so a
//! concurrent refresh is either fully visible or not visible at all.

mod views;

pub use views::*;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::CacheStore;

/// Addon identity and id scheme
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AddonConfig {
    #[serde(default = "default_addon_id")]
    pub id: String,
    #[serde(default = "default_addon_name")]
    pub name: String,
    #[serde(default = "default_addon_description")]
    pub description: String,
    /// Prefix of externally exposed ids ("<prefix>-<tmdb id>").
    #[serde(default = "default_id_prefix")]
    pub id_prefix: String,
    #[serde(default = "default_catalog_id")]
    pub catalog_id: String,
    #[serde(default = "default_catalog_name")]
    pub catalog_name: String,
}

impl Default for AddonConfig {
    fn default() -> Self {
        Self {
            id: default_addon_id(),
            name: default_addon_name(),
            description: default_addon_description(),
            id_prefix: default_id_prefix(),
            catalog_id: default_catalog_id(),
            catalog_name: default_catalog_name(),
        }
    }
}

fn default_addon_id() -> String {
    "org.marquee.tmdb".to_string()
}

fn default_addon_name() -> String {
    "Marquee".to_string()
}

fn default_addon_description() -> String {
    "Recent movies discovered on TMDB, refreshed daily".to_string()
}

fn default_id_prefix() -> String {
    "tmdb".to_string()
}

fn default_catalog_id() -> String {
    "tmdb-recent".to_string()
}

fn default_catalog_name() -> String {
    "Recent Movies".to_string()
}

/// Answers catalog and metadata requests from the cache.
#[derive(Clone)]
pub struct QueryService {
    store: Arc<CacheStore>,
    images: ImageUrls,
    id_prefix: String,
}

impl QueryService {
    pub fn new(store: Arc<CacheStore>, image_base_url: &str, id_prefix: &str) -> Self {
        Self {
            store,
            images: ImageUrls::new(image_base_url),
            id_prefix: id_prefix.to_string(),
        }
    }

    pub fn id_prefix(&self) -> &str {
        &self.id_prefix
    }

    /// List the catalog, optionally filtered by a case-insensitive title
    /// substring. An empty or missing query returns everything.
    pub fn search_catalog(&self, query: Option<&str>) -> Vec<CatalogSummary> {
        let state = self.store.current();
        let needle = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);

        let summaries: Vec<CatalogSummary> = state
            .catalog
            .entries
            .iter()
            .filter(|entry| match &needle {
                Some(needle) => entry.title.to_lowercase().contains(needle.as_str()),
                None => true,
            })
            .map(|entry| CatalogSummary::from_entry(entry, &self.id_prefix, &self.images))
            .collect();

        debug!(
            "Catalog search {:?}: {} of {} entries",
            query,
            summaries.len(),
            state.catalog.len()
        );
        summaries
    }

    /// Look up metadata by external id.
    ///
    /// `None` for unparsable ids, unknown ids and failed lookups alike.
    pub fn get_metadata(&self, id: &str) -> Option<MetadataView> {
        let Some(tmdb_id) = parse_external_id(&self.id_prefix, id) else {
            debug!("Ignoring metadata request for foreign id {:?}", id);
            return None;
        };

        let state = self.store.current();
        let details = state.metadata.get(tmdb_id)?.record.details()?;
        Some(MetadataView::from_details(
            details,
            &self.id_prefix,
            &self.images,
        ))
    }
}
