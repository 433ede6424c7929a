//! TMDB (The Movie Database) integration.
//!
//! [`MetadataSource`] is the outbound seam: [`TmdbClient`] implements it over
//! HTTP and tests swap in `testing::MockMetadataSource`. [`CatalogFetcher`]
//! layers pagination and per-call failure containment on top.

mod client;
mod fetch;
mod types;

pub use client::{TmdbClient, TmdbConfig};
pub use fetch::{CatalogFetcher, DiscoverConfig};
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from a single outbound TMDB call.
///
/// Always recoverable by skipping the unit of work (one page, one item).
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded, please wait before retrying")]
    RateLimitExceeded,

    /// Resource not found (404).
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Client not configured (missing API key, etc.).
    #[error("Client not configured: {0}")]
    NotConfigured(String),
}

/// Read-only operations against the remote metadata API.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Fetch one page of discover results for a combination.
    async fn discover(
        &self,
        filters: &DiscoverFilters,
        combination: &QueryCombination,
        page: u32,
    ) -> Result<DiscoverPage, FetchError>;

    /// Fetch full details for one movie.
    async fn movie_details(&self, tmdb_id: u32) -> Result<MovieDetails, FetchError>;
}
