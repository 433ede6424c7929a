//! External-facing views of cached records.

use serde::Serialize;

use crate::tmdb::{CatalogEntry, MovieDetails};

pub const DEFAULT_DESCRIPTION: &str = "No description available";
pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN: &str = "Unknown";
pub const NOT_RATED: &str = "N/A";

const POSTER_SIZE: &str = "w500";
const BACKGROUND_SIZE: &str = "original";

/// Builds image URLs from TMDB path fragments.
#[derive(Debug, Clone)]
pub struct ImageUrls {
    base_url: String,
}

impl ImageUrls {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn poster(&self, path: Option<&str>) -> Option<String> {
        self.build(POSTER_SIZE, path)
    }

    pub fn background(&self, path: Option<&str>) -> Option<String> {
        self.build(BACKGROUND_SIZE, path)
    }

    fn build(&self, size: &str, path: Option<&str>) -> Option<String> {
        let path = path.filter(|p| !p.is_empty())?;
        Some(format!("{}/{}{}", self.base_url, size, path))
    }
}

/// Catalog listing item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSummary {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    pub description: String,
    pub release_info: String,
}

impl CatalogSummary {
    pub fn from_entry(entry: &CatalogEntry, id_prefix: &str, images: &ImageUrls) -> Self {
        Self {
            id: external_id(id_prefix, entry.id),
            kind: "movie".to_string(),
            name: entry.title.clone(),
            poster: images.poster(entry.poster_path.as_deref()),
            description: description_or_default(entry.overview.as_deref()),
            release_info: release_year(&entry.release_date.format("%Y-%m-%d").to_string()),
        }
    }
}

/// Full metadata for one movie.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataView {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    pub genres: Vec<String>,
    pub runtime: String,
    pub imdb_rating: String,
    pub description: String,
    pub release_info: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
}

impl MetadataView {
    pub fn from_details(details: &MovieDetails, id_prefix: &str, images: &ImageUrls) -> Self {
        Self {
            id: external_id(id_prefix, details.id),
            kind: "movie".to_string(),
            name: details
                .title
                .clone()
                .unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            poster: images.poster(details.poster_path.as_deref()),
            background: images.background(details.backdrop_path.as_deref()),
            genres: details.genres.iter().map(|g| g.name.clone()).collect(),
            runtime: format_runtime(details.runtime_minutes),
            imdb_rating: format_rating(details.vote_average),
            description: description_or_default(details.overview.as_deref()),
            release_info: details
                .year()
                .map(|y| y.to_string())
                .unwrap_or_else(|| UNKNOWN.to_string()),
            imdb_id: details.imdb_id.clone(),
        }
    }
}

/// "<prefix>-<tmdb id>"
pub fn external_id(id_prefix: &str, tmdb_id: u32) -> String {
    format!("{}-{}", id_prefix, tmdb_id)
}

/// Inverse of [`external_id`].
pub fn parse_external_id(id_prefix: &str, id: &str) -> Option<u32> {
    id.strip_prefix(id_prefix)?.strip_prefix('-')?.parse().ok()
}

/// Year part of a `YYYY-...` date, or "Unknown".
pub fn release_year(date: &str) -> String {
    match date.split('-').next() {
        Some(year) if year.len() == 4 && year.chars().all(|c| c.is_ascii_digit()) => {
            year.to_string()
        }
        _ => UNKNOWN.to_string(),
    }
}

/// "136 min", or "Unknown" when missing or zero.
pub fn format_runtime(minutes: Option<u32>) -> String {
    match minutes {
        Some(m) if m > 0 => format!("{} min", m),
        _ => UNKNOWN.to_string(),
    }
}

/// One decimal place, or "N/A" when missing or zero (no votes).
pub fn format_rating(vote_average: Option<f32>) -> String {
    match vote_average {
        Some(v) if v > 0.0 => format!("{:.1}", v),
        _ => NOT_RATED.to_string(),
    }
}

fn description_or_default(text: Option<&str>) -> String {
    text.filter(|t| !t.trim().is_empty())
        .unwrap_or(DEFAULT_DESCRIPTION)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[test]
    fn test_external_id_round_trip() {
        assert_eq!(external_id("tmdb", 603), "tmdb-603");
        assert_eq!(parse_external_id("tmdb", "tmdb-603"), Some(603));
    }

    #[test]
    fn test_parse_external_id_rejects() {
        assert_eq!(parse_external_id("tmdb", "603"), None);
        assert_eq!(parse_external_id("tmdb", "tt0133093"), None);
        assert_eq!(parse_external_id("tmdb", "tmdb-"), None);
        assert_eq!(parse_external_id("tmdb", "tmdb-abc"), None);
        assert_eq!(parse_external_id("tmdb", "tmdb603"), None);
        assert_eq!(parse_external_id("tmdb", "imdb-603"), None);
    }

    #[test]
    fn test_release_year() {
        assert_eq!(release_year("1999-03-30"), "1999");
        assert_eq!(release_year(""), "Unknown");
        assert_eq!(release_year("soon"), "Unknown");
    }

    #[test]
    fn test_format_runtime() {
        assert_eq!(format_runtime(Some(136)), "136 min");
        assert_eq!(format_runtime(Some(0)), "Unknown");
        assert_eq!(format_runtime(None), "Unknown");
    }

    #[test]
    fn test_format_rating() {
        assert_eq!(format_rating(Some(8.26)), "8.3");
        assert_eq!(format_rating(Some(7.0)), "7.0");
        assert_eq!(format_rating(Some(0.0)), "N/A");
        assert_eq!(format_rating(None), "N/A");
    }

    #[test]
    fn test_image_urls() {
        let images = ImageUrls::new("https://image.tmdb.org/t/p/");
        assert_eq!(
            images.poster(Some("/abc.jpg")).as_deref(),
            Some("https://image.tmdb.org/t/p/w500/abc.jpg")
        );
        assert_eq!(
            images.background(Some("/bg.jpg")).as_deref(),
            Some("https://image.tmdb.org/t/p/original/bg.jpg")
        );
        assert!(images.poster(None).is_none());
        assert!(images.poster(Some("")).is_none());
    }

    #[test]
    fn test_summary_defaults_description() {
        let images = ImageUrls::new("https://img");
        let mut entry = fixtures::catalog_entry(1, "Heat", "1995-12-15");
        entry.overview = None;
        entry.poster_path = None;

        let summary = CatalogSummary::from_entry(&entry, "tmdb", &images);
        assert_eq!(summary.id, "tmdb-1");
        assert_eq!(summary.kind, "movie");
        assert_eq!(summary.description, DEFAULT_DESCRIPTION);
        assert_eq!(summary.release_info, "1995");
        assert!(summary.poster.is_none());

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["type"], "movie");
        assert_eq!(json["releaseInfo"], "1995");
        assert!(json.get("poster").is_none());
    }

    #[test]
    fn test_metadata_view_defaults() {
        let images = ImageUrls::new("https://img");
        let mut details = fixtures::movie_details(7, "Anything");
        details.title = None;
        details.release_date = None;
        details.runtime_minutes = None;
        details.vote_average = None;
        details.overview = Some("   ".to_string());
        details.genres.clear();

        let view = MetadataView::from_details(&details, "tmdb", &images);
        assert_eq!(view.name, UNKNOWN_TITLE);
        assert_eq!(view.runtime, "Unknown");
        assert_eq!(view.imdb_rating, "N/A");
        assert_eq!(view.description, DEFAULT_DESCRIPTION);
        assert_eq!(view.release_info, "Unknown");
        assert!(view.genres.is_empty());
    }
}
