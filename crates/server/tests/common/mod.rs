//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with a mock metadata source injected, so the addon endpoints and the
//! refresh flow can be exercised without reaching TMDB.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{TimeZone, Utc};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use marquee_core::{
    load_config_from_str, testing::MockMetadataSource, CacheStore, CatalogFetcher, Config,
    MetadataSource, RefreshPipeline, RefreshScheduler, SnapshotStorage,
};
use marquee_server::{api::create_router, state::AppState};

/// Re-export fixtures for test convenience
pub use marquee_core::testing::fixtures;

/// Test fixture for E2E testing with a mock metadata source.
///
/// The cache starts with a seeded snapshot (see [`seed_state`]); the mock
/// source is empty until a test configures it, so refreshes are explicit.
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock TMDB - configure discover pages and details
    pub source: Arc<MockMetadataSource>,
    pub store: Arc<CacheStore>,
    pub scheduler: Arc<RefreshScheduler>,
    /// Temporary directory holding the cache files
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with the seeded cache.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        SnapshotStorage::new(temp_dir.path())
            .save(&seed_state())
            .expect("Failed to seed cache");
        Self::with_dir(temp_dir).await
    }

    /// Create a test fixture whose cache starts empty.
    pub async fn empty() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        Self::with_dir(temp_dir).await
    }

    async fn with_dir(temp_dir: TempDir) -> Self {
        let config = test_config(&temp_dir);

        let source = Arc::new(MockMetadataSource::new());
        let store = Arc::new(CacheStore::open(SnapshotStorage::new(&config.cache.dir)));
        let fetcher = CatalogFetcher::from_config(
            Arc::clone(&source) as Arc<dyn MetadataSource>,
            &config.discover,
        );
        let pipeline = Arc::new(RefreshPipeline::new(
            fetcher,
            config.discover.combinations.clone(),
            Arc::clone(&store),
        ));
        let scheduler = Arc::new(RefreshScheduler::new(
            config.schedule.clone(),
            config.cache.staleness(),
            pipeline,
        ));
        scheduler.start().await;

        let state = Arc::new(AppState::new(
            config,
            Arc::clone(&store),
            Arc::clone(&scheduler),
        ));
        let router = create_router(state);

        Self {
            router,
            source,
            store,
            scheduler,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path).await
    }

    /// Send a POST request without a body.
    pub async fn post(&self, path: &str) -> TestResponse {
        self.request("POST", path).await
    }

    /// Poll until the scheduler has completed `runs` refreshes.
    pub async fn wait_for_runs(&self, runs: u64) {
        for _ in 0..200 {
            if self.scheduler.completed_runs() >= runs {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "Expected {} completed runs, saw {}",
            runs,
            self.scheduler.completed_runs()
        );
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

fn test_config(temp_dir: &TempDir) -> Config {
    let toml = format!(
        r#"
[server]
host = "127.0.0.1"
port = 7000

[tmdb]
api_key = "test-key"
image_base_url = "https://images.test/t/p"

[discover]
page_cap = 2

[[discover.combinations]]
genres = [28]
mode = "all"

[cache]
dir = "{}"

[schedule]
refresh_on_startup = false
"#,
        temp_dir.path().display()
    );
    load_config_from_str(&toml).expect("Failed to parse test config")
}

/// Three cached movies, newest first, each with fetched metadata.
pub fn seed_state() -> marquee_core::CacheState {
    fixtures::cache_state(
        vec![
            fixtures::catalog_entry(10138, "Iron Man 2", "2010-04-28"),
            fixtures::catalog_entry(1726, "Iron Man", "2008-04-30"),
            fixtures::catalog_entry(550, "Fight Club", "1999-10-15"),
        ],
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
    )
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
