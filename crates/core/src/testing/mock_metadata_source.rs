//! Mock metadata source for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Notify, RwLock, Semaphore};

use crate::tmdb::{
    DiscoverFilters, DiscoverPage, DiscoveredMovie, FetchError, MetadataSource, MovieDetails,
    QueryCombination,
};

/// A recorded outbound call for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedQuery {
    Discover {
        combination: QueryCombination,
        page: u32,
    },
    Details {
        tmdb_id: u32,
    },
}

/// Mock implementation of the MetadataSource trait.
///
/// Provides controllable behavior for testing:
/// - Return configurable discover pages and movie details
/// - Track queries for assertions
/// - Simulate failures per page or per movie
/// - Hold discover calls open until released (to observe in-flight runs)
///
/// # Example
///
/// ```rust,ignore
/// use marquee_core::testing::{MockMetadataSource, fixtures};
///
/// let source = MockMetadataSource::new();
/// source.set_pages(QueryCombination::default(), vec![vec![
///     fixtures::discovered_movie(603, "The Matrix", "1999-03-30"),
/// ]]).await;
/// source.add_details(fixtures::movie_details(603, "The Matrix")).await;
/// ```
#[derive(Debug)]
pub struct MockMetadataSource {
    /// Discover pages per combination (index 0 is page 1).
    pages: Arc<RwLock<HashMap<QueryCombination, Vec<Vec<DiscoveredMovie>>>>>,
    /// Pages that fail.
    failing_pages: Arc<RwLock<HashSet<(QueryCombination, u32)>>>,
    /// Movie details by ID.
    details: Arc<RwLock<HashMap<u32, MovieDetails>>>,
    /// Movie IDs whose details lookup fails.
    failing_details: Arc<RwLock<HashSet<u32>>>,
    /// Recorded queries.
    queries: Arc<RwLock<Vec<RecordedQuery>>>,
    /// While set, discover calls wait on this semaphore until it is closed.
    gate: Arc<RwLock<Option<Arc<Semaphore>>>>,
    /// Signalled whenever a discover call starts.
    discover_started: Arc<Notify>,
}

impl Default for MockMetadataSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMetadataSource {
    /// Create a new empty mock source.
    pub fn new() -> Self {
        Self {
            pages: Arc::new(RwLock::new(HashMap::new())),
            failing_pages: Arc::new(RwLock::new(HashSet::new())),
            details: Arc::new(RwLock::new(HashMap::new())),
            failing_details: Arc::new(RwLock::new(HashSet::new())),
            queries: Arc::new(RwLock::new(Vec::new())),
            gate: Arc::new(RwLock::new(None)),
            discover_started: Arc::new(Notify::new()),
        }
    }

    // =========================================================================
    // Discover Configuration
    // =========================================================================

    /// Set the pages returned for a combination. `total_pages` is `pages.len()`.
    pub async fn set_pages(&self, combination: QueryCombination, pages: Vec<Vec<DiscoveredMovie>>) {
        self.pages.write().await.insert(combination, pages);
    }

    /// Make one page of a combination fail.
    pub async fn fail_page(&self, combination: QueryCombination, page: u32) {
        self.failing_pages.write().await.insert((combination, page));
    }

    /// Make every page of every combination fail.
    pub async fn fail_all_pages(&self) {
        let pages = self.pages.read().await;
        let mut failing = self.failing_pages.write().await;
        for (combination, combination_pages) in pages.iter() {
            for page in 1..=combination_pages.len() as u32 {
                failing.insert((combination.clone(), page));
            }
        }
    }

    /// Clear all page failures.
    pub async fn clear_page_failures(&self) {
        self.failing_pages.write().await.clear();
    }

    // =========================================================================
    // Details Configuration
    // =========================================================================

    /// Add movie details.
    pub async fn add_details(&self, details: MovieDetails) {
        self.details.write().await.insert(details.id, details);
    }

    /// Make the details lookup for a movie fail.
    pub async fn fail_details(&self, tmdb_id: u32) {
        self.failing_details.write().await.insert(tmdb_id);
    }

    // =========================================================================
    // Query Recording
    // =========================================================================

    /// Get all recorded queries.
    pub async fn recorded_queries(&self) -> Vec<RecordedQuery> {
        self.queries.read().await.clone()
    }

    /// Number of discover calls performed.
    pub async fn discover_count(&self) -> usize {
        self.queries
            .read()
            .await
            .iter()
            .filter(|q| matches!(q, RecordedQuery::Discover { .. }))
            .count()
    }

    /// Number of details calls performed.
    pub async fn details_count(&self) -> usize {
        self.queries
            .read()
            .await
            .iter()
            .filter(|q| matches!(q, RecordedQuery::Details { .. }))
            .count()
    }

    /// Clear recorded queries.
    pub async fn clear_recorded(&self) {
        self.queries.write().await.clear();
    }

    // =========================================================================
    // Flow Control
    // =========================================================================

    /// Hold every subsequent discover call until [`Self::resume`] is called.
    pub async fn pause(&self) {
        *self.gate.write().await = Some(Arc::new(Semaphore::new(0)));
    }

    /// Release held discover calls.
    pub async fn resume(&self) {
        if let Some(gate) = self.gate.write().await.take() {
            gate.close();
        }
    }

    /// Wait until the next discover call starts.
    pub async fn wait_for_discover(&self) {
        self.discover_started.notified().await;
    }
}

#[async_trait]
impl MetadataSource for MockMetadataSource {
    async fn discover(
        &self,
        _filters: &DiscoverFilters,
        combination: &QueryCombination,
        page: u32,
    ) -> Result<DiscoverPage, FetchError> {
        self.queries.write().await.push(RecordedQuery::Discover {
            combination: combination.clone(),
            page,
        });
        self.discover_started.notify_one();

        let gate = self.gate.read().await.clone();
        if let Some(gate) = gate {
            // Closed semaphore means resumed.
            let _ = gate.acquire().await;
        }

        if self
            .failing_pages
            .read()
            .await
            .contains(&(combination.clone(), page))
        {
            return Err(FetchError::ApiError {
                status: 500,
                message: format!("mock failure for {} page {}", combination, page),
            });
        }

        let pages = self.pages.read().await;
        let Some(combination_pages) = pages.get(combination) else {
            return Ok(DiscoverPage {
                page,
                total_pages: 0,
                results: vec![],
            });
        };

        let results = combination_pages
            .get(page.saturating_sub(1) as usize)
            .cloned()
            .unwrap_or_default();

        Ok(DiscoverPage {
            page,
            total_pages: combination_pages.len() as u32,
            results,
        })
    }

    async fn movie_details(&self, tmdb_id: u32) -> Result<MovieDetails, FetchError> {
        self.queries
            .write()
            .await
            .push(RecordedQuery::Details { tmdb_id });

        if self.failing_details.read().await.contains(&tmdb_id) {
            return Err(FetchError::ApiError {
                status: 500,
                message: format!("mock failure for movie {}", tmdb_id),
            });
        }

        self.details
            .read()
            .await
            .get(&tmdb_id)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(format!("movie {}", tmdb_id)))
    }
}
