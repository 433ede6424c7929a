//! Testing utilities and mock implementations.
//!
//! Provides a mock [`MetadataSource`](crate::tmdb::MetadataSource) so the
//! refresh pipeline, scheduler and HTTP surface can be exercised without
//! reaching TMDB.
//!
//! # Example
//!
//! ```rust,ignore
//! use marquee_core::testing::{fixtures, MockMetadataSource};
//!
//! let source = MockMetadataSource::new();
//! source.add_details(fixtures::movie_details(603, "The Matrix")).await;
//! ```

mod mock_metadata_source;

pub use mock_metadata_source::{MockMetadataSource, RecordedQuery};

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{DateTime, NaiveDate, Utc};

    use crate::cache::{CacheState, CatalogSnapshot, MetadataEntry, MetadataTable};
    use crate::tmdb::{CatalogEntry, DiscoveredMovie, Genre, MetadataRecord, MovieDetails};

    /// Create a discover result with reasonable defaults.
    pub fn discovered_movie(id: u32, title: &str, release_date: &str) -> DiscoveredMovie {
        DiscoveredMovie {
            id,
            title: title.to_string(),
            release_date: Some(release_date.to_string()),
            poster_path: Some(format!("/poster-{}.jpg", id)),
            backdrop_path: Some(format!("/backdrop-{}.jpg", id)),
            overview: Some(format!("A movie about {}.", title.to_lowercase())),
            vote_average: Some(7.5),
        }
    }

    /// Create a catalog entry. `release_date` must be `YYYY-MM-DD`.
    pub fn catalog_entry(id: u32, title: &str, release_date: &str) -> CatalogEntry {
        CatalogEntry {
            id,
            title: title.to_string(),
            release_date: NaiveDate::parse_from_str(release_date, "%Y-%m-%d")
                .expect("fixture release date"),
            poster_path: Some(format!("/poster-{}.jpg", id)),
            backdrop_path: Some(format!("/backdrop-{}.jpg", id)),
            overview: Some(format!("A movie about {}.", title.to_lowercase())),
            vote_average: Some(7.5),
        }
    }

    /// Create movie details.
    pub fn movie_details(id: u32, title: &str) -> MovieDetails {
        MovieDetails {
            id,
            title: Some(title.to_string()),
            release_date: Some("2020-06-15".to_string()),
            runtime_minutes: Some(120),
            vote_average: Some(7.46),
            overview: Some(format!("A movie about {}.", title.to_lowercase())),
            tagline: None,
            poster_path: Some(format!("/poster-{}.jpg", id)),
            backdrop_path: Some(format!("/backdrop-{}.jpg", id)),
            genres: vec![
                Genre {
                    id: 18,
                    name: "Drama".to_string(),
                },
                Genre {
                    id: 53,
                    name: "Thriller".to_string(),
                },
            ],
            imdb_id: Some(format!("tt{:07}", id)),
        }
    }

    /// Build a cache state where every entry has fetched metadata.
    pub fn cache_state(entries: Vec<CatalogEntry>, fetched_at: DateTime<Utc>) -> CacheState {
        let mut metadata = MetadataTable::new();
        for entry in &entries {
            metadata.insert(
                entry.id,
                MetadataEntry {
                    fetched_at,
                    record: MetadataRecord::Fetched(movie_details(entry.id, &entry.title)),
                },
            );
        }
        CacheState {
            catalog: CatalogSnapshot::new(fetched_at, entries),
            metadata,
        }
    }
}
