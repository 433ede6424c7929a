//! TMDB API client.
//!
//! TMDB requires an API key for access.
//! Rate limits are generous (around 40 requests per second).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{
    DiscoverFilters, DiscoverPage, DiscoveredMovie, Genre, MovieDetails, QueryCombination,
};
use super::{FetchError, MetadataSource};

const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";
const DEFAULT_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";

/// TMDB API client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbConfig {
    /// TMDB API key (required).
    pub api_key: String,
    /// Base URL (default: https://api.themoviedb.org/3).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Image base URL for posters/backdrops.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base_url: Option<String>,
    /// Result language (e.g. "en-US").
    #[serde(default = "default_language")]
    pub language: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_timeout() -> u32 {
    30
}

impl TmdbConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            image_base_url: None,
            language: default_language(),
            timeout_secs: default_timeout(),
        }
    }

    /// Image base URL with the default applied.
    pub fn image_base_url(&self) -> String {
        self.image_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_IMAGE_BASE_URL.to_string())
    }
}

/// TMDB API client.
pub struct TmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
    language: String,
}

impl TmdbClient {
    /// Create a new TMDB client.
    pub fn new(config: TmdbConfig) -> Result<Self, FetchError> {
        if config.api_key.is_empty() {
            return Err(FetchError::NotConfigured(
                "TMDB API key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()?;

        let base_url = config
            .base_url
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key,
            language: config.language,
        })
    }

    /// Query parameters for a discover request.
    fn discover_params(
        &self,
        filters: &DiscoverFilters,
        combination: &QueryCombination,
        page: u32,
    ) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("api_key", self.api_key.clone()),
            ("language", self.language.clone()),
            ("sort_by", filters.sort_by.clone()),
            ("include_adult", "false".to_string()),
            ("include_video", "false".to_string()),
            ("page", page.to_string()),
        ];

        if let Some(gte) = filters.release_date_gte {
            params.push(("primary_release_date.gte", gte.format("%Y-%m-%d").to_string()));
        }
        if let Some(lte) = filters.release_date_lte {
            params.push(("primary_release_date.lte", lte.format("%Y-%m-%d").to_string()));
        }
        if let Some(score) = filters.min_vote_average {
            params.push(("vote_average.gte", score.to_string()));
        }
        if let Some(count) = filters.min_vote_count {
            params.push(("vote_count.gte", count.to_string()));
        }
        if let Some(lang) = &filters.original_language {
            params.push(("with_original_language", lang.clone()));
        }
        if let Some(genres) = combination.with_genres_param() {
            params.push(("with_genres", genres));
        }
        if !filters.exclude_genres.is_empty() {
            let excluded = filters
                .exclude_genres
                .iter()
                .map(|g| g.to_string())
                .collect::<Vec<_>>()
                .join(",");
            params.push(("without_genres", excluded));
        }

        params
    }

    /// Map non-success statuses to errors and decode the JSON body.
    async fn decode<T: DeserializeOwned>(
        response: Response,
        what: &str,
    ) -> Result<T, FetchError> {
        let status = response.status();
        if status == 401 {
            return Err(FetchError::NotConfigured(
                "Invalid TMDB API key".to_string(),
            ));
        }
        if status == 404 {
            return Err(FetchError::NotFound(what.to_string()));
        }
        if status == 429 {
            return Err(FetchError::RateLimitExceeded);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        response.json().await.map_err(|e| {
            FetchError::ParseError(format!("Failed to parse {} response: {}", what, e))
        })
    }
}

#[async_trait]
impl MetadataSource for TmdbClient {
    async fn discover(
        &self,
        filters: &DiscoverFilters,
        combination: &QueryCombination,
        page: u32,
    ) -> Result<DiscoverPage, FetchError> {
        let url = format!("{}/discover/movie", self.base_url);

        debug!("TMDB discover: {}, page={}", combination, page);

        let response = self
            .client
            .get(&url)
            .query(&self.discover_params(filters, combination, page))
            .send()
            .await?;

        let result: TmdbDiscoverResponse = Self::decode(response, "discover").await?;

        Ok(result.into())
    }

    async fn movie_details(&self, tmdb_id: u32) -> Result<MovieDetails, FetchError> {
        let url = format!("{}/movie/{}", self.base_url, tmdb_id);

        debug!("TMDB get movie: id={}", tmdb_id);

        let response = self
            .client
            .get(&url)
            .query(&[("api_key", &self.api_key), ("language", &self.language)])
            .send()
            .await?;

        let movie: TmdbMovieDetails =
            Self::decode(response, &format!("movie {}", tmdb_id)).await?;

        Ok(movie.into())
    }
}

// ============================================================================
// TMDB API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct TmdbDiscoverResponse {
    #[serde(default)]
    page: u32,
    #[serde(default)]
    total_pages: u32,
    #[serde(default)]
    results: Vec<TmdbMovieResult>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovieResult {
    id: u32,
    #[serde(default)]
    title: String,
    release_date: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    vote_average: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovieDetails {
    id: u32,
    title: Option<String>,
    release_date: Option<String>,
    runtime: Option<u32>,
    overview: Option<String>,
    tagline: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    #[serde(default)]
    genres: Vec<TmdbGenre>,
    vote_average: Option<f32>,
    imdb_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbGenre {
    id: u32,
    name: String,
}

// ============================================================================
// Conversions
// ============================================================================

/// TMDB sends "" for unknown optional strings.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl From<TmdbDiscoverResponse> for DiscoverPage {
    fn from(r: TmdbDiscoverResponse) -> Self {
        Self {
            page: r.page,
            total_pages: r.total_pages,
            results: r.results.into_iter().map(|m| m.into()).collect(),
        }
    }
}

impl From<TmdbMovieResult> for DiscoveredMovie {
    fn from(r: TmdbMovieResult) -> Self {
        Self {
            id: r.id,
            title: r.title,
            release_date: non_empty(r.release_date),
            poster_path: non_empty(r.poster_path),
            backdrop_path: non_empty(r.backdrop_path),
            overview: non_empty(r.overview),
            vote_average: r.vote_average,
        }
    }
}

impl From<TmdbMovieDetails> for MovieDetails {
    fn from(d: TmdbMovieDetails) -> Self {
        Self {
            id: d.id,
            title: non_empty(d.title),
            release_date: non_empty(d.release_date),
            runtime_minutes: d.runtime,
            vote_average: d.vote_average,
            overview: non_empty(d.overview),
            tagline: non_empty(d.tagline),
            poster_path: non_empty(d.poster_path),
            backdrop_path: non_empty(d.backdrop_path),
            genres: d
                .genres
                .into_iter()
                .map(|g| Genre {
                    id: g.id,
                    name: g.name,
                })
                .collect(),
            imdb_id: non_empty(d.imdb_id),
        }
    }
}
