//! Types shared between the TMDB client, the fetcher and the cache.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// Query Combinations
// ============================================================================

/// How the genres of a combination are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenreMatch {
    /// Movie must carry every genre (TMDB `,` separator).
    #[default]
    All,
    /// Movie must carry at least one genre (TMDB `|` separator).
    Any,
}

/// One genre filter used to partition catalog discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryCombination {
    /// TMDB genre ids. Empty means no genre filter.
    #[serde(default)]
    pub genres: Vec<u32>,
    /// AND / OR semantics for `genres`.
    #[serde(default)]
    pub mode: GenreMatch,
}

impl QueryCombination {
    pub fn all_of(genres: impl Into<Vec<u32>>) -> Self {
        Self {
            genres: genres.into(),
            mode: GenreMatch::All,
        }
    }

    pub fn any_of(genres: impl Into<Vec<u32>>) -> Self {
        Self {
            genres: genres.into(),
            mode: GenreMatch::Any,
        }
    }

    /// Value for the `with_genres` discover parameter, if any.
    pub fn with_genres_param(&self) -> Option<String> {
        if self.genres.is_empty() {
            return None;
        }
        let separator = match self.mode {
            GenreMatch::All => ",",
            GenreMatch::Any => "|",
        };
        Some(
            self.genres
                .iter()
                .map(|g| g.to_string())
                .collect::<Vec<_>>()
                .join(separator),
        )
    }
}

impl std::fmt::Display for QueryCombination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.with_genres_param() {
            Some(genres) => write!(f, "genres[{}]", genres),
            None => write!(f, "genres[*]"),
        }
    }
}

/// Filters applied to every discover request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoverFilters {
    /// Earliest primary release date (inclusive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date_gte: Option<NaiveDate>,
    /// Latest primary release date (inclusive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date_lte: Option<NaiveDate>,
    /// Minimum vote average (0-10).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_vote_average: Option<f32>,
    /// Minimum vote count, to keep barely-rated titles out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_vote_count: Option<u32>,
    /// ISO 639-1 original language filter (e.g. "en").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_language: Option<String>,
    /// Genre ids excluded from every query.
    #[serde(default)]
    pub exclude_genres: Vec<u32>,
    /// TMDB sort order.
    #[serde(default = "default_sort_by")]
    pub sort_by: String,
}

impl Default for DiscoverFilters {
    fn default() -> Self {
        Self {
            release_date_gte: None,
            release_date_lte: None,
            min_vote_average: None,
            min_vote_count: None,
            original_language: None,
            exclude_genres: Vec::new(),
            sort_by: default_sort_by(),
        }
    }
}

fn default_sort_by() -> String {
    "popularity.desc".to_string()
}

// ============================================================================
// Discover Results
// ============================================================================

/// One page of discover results as returned by the API.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoverPage {
    pub page: u32,
    pub total_pages: u32,
    pub results: Vec<DiscoveredMovie>,
}

/// A raw discover result, before release date validation.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredMovie {
    pub id: u32,
    pub title: String,
    pub release_date: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub overview: Option<String>,
    pub vote_average: Option<f32>,
}

/// Entries of one page that survived validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageResult {
    pub entries: Vec<CatalogEntry>,
    pub total_pages: u32,
}

/// One discovered catalog item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// TMDB movie ID.
    pub id: u32,
    /// Movie title.
    pub title: String,
    /// Primary release date.
    pub release_date: NaiveDate,
    /// Poster path (relative to TMDB image base URL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
    /// Backdrop path (relative to TMDB image base URL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop_path: Option<String>,
    /// Short synopsis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    /// Average vote (0-10).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_average: Option<f32>,
}

impl CatalogEntry {
    /// Validate a discover result. Returns `None` when the release date is
    /// missing or not a `YYYY-MM-DD` date.
    pub fn from_discovered(movie: DiscoveredMovie) -> Option<Self> {
        let release_date = movie
            .release_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())?;

        Some(Self {
            id: movie.id,
            title: movie.title,
            release_date,
            poster_path: movie.poster_path,
            backdrop_path: movie.backdrop_path,
            overview: movie.overview,
            vote_average: movie.vote_average,
        })
    }
}

// ============================================================================
// Metadata
// ============================================================================

/// A genre attached to a movie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    pub id: u32,
    pub name: String,
}

/// Full detail for one movie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetails {
    /// TMDB movie ID.
    pub id: u32,
    /// Movie title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Release date (YYYY-MM-DD), as returned by the API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    /// Runtime in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_minutes: Option<u32>,
    /// Average vote (0-10).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_average: Option<f32>,
    /// Movie overview/synopsis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    /// IMDb identifier (tt...), when TMDB knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
}

impl MovieDetails {
    /// Get the release year from the release date.
    pub fn year(&self) -> Option<i32> {
        self.release_date
            .as_ref()
            .and_then(|d| d.split('-').next())
            .and_then(|y| y.parse().ok())
    }
}

/// Stored outcome of a metadata lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MetadataRecord {
    /// Lookup succeeded.
    Fetched(MovieDetails),
    /// Lookup failed; kept so the read path can tell "tried" from "never seen".
    Failed { reason: String },
}

impl MetadataRecord {
    pub fn details(&self) -> Option<&MovieDetails> {
        match self {
            Self::Fetched(details) => Some(details),
            Self::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discovered(release_date: Option<&str>) -> DiscoveredMovie {
        DiscoveredMovie {
            id: 603,
            title: "The Matrix".to_string(),
            release_date: release_date.map(str::to_string),
            poster_path: Some("/poster.jpg".to_string()),
            backdrop_path: None,
            overview: Some("A computer hacker...".to_string()),
            vote_average: Some(8.2),
        }
    }

    #[test]
    fn test_with_genres_param_and() {
        let combo = QueryCombination::all_of(vec![28, 12]);
        assert_eq!(combo.with_genres_param().as_deref(), Some("28,12"));
    }

    #[test]
    fn test_with_genres_param_or() {
        let combo = QueryCombination::any_of(vec![35, 18, 10749]);
        assert_eq!(combo.with_genres_param().as_deref(), Some("35|18|10749"));
    }

    #[test]
    fn test_with_genres_param_empty() {
        let combo = QueryCombination::default();
        assert!(combo.with_genres_param().is_none());
        assert_eq!(combo.to_string(), "genres[*]");
    }

    #[test]
    fn test_entry_from_discovered_valid_date() {
        let entry = CatalogEntry::from_discovered(discovered(Some("1999-03-30"))).unwrap();
        assert_eq!(entry.id, 603);
        assert_eq!(
            entry.release_date,
            NaiveDate::from_ymd_opt(1999, 3, 30).unwrap()
        );
    }

    #[test]
    fn test_entry_from_discovered_rejects_bad_dates() {
        assert!(CatalogEntry::from_discovered(discovered(None)).is_none());
        assert!(CatalogEntry::from_discovered(discovered(Some(""))).is_none());
        assert!(CatalogEntry::from_discovered(discovered(Some("1999"))).is_none());
        assert!(CatalogEntry::from_discovered(discovered(Some("1999-13-40"))).is_none());
    }

    #[test]
    fn test_metadata_record_serde_tagging() {
        let failed = MetadataRecord::Failed {
            reason: "timeout".to_string(),
        };
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["reason"], "timeout");

        let back: MetadataRecord = serde_json::from_value(json).unwrap();
        assert!(back.is_failed());
        assert!(back.details().is_none());
    }

    #[test]
    fn test_movie_details_year() {
        let details = MovieDetails {
            id: 1,
            title: Some("Test Movie".to_string()),
            release_date: Some("1999-03-31".to_string()),
            runtime_minutes: None,
            vote_average: None,
            overview: None,
            tagline: None,
            poster_path: None,
            backdrop_path: None,
            genres: vec![],
            imdb_id: None,
        };
        assert_eq!(details.year(), Some(1999));
    }
}
