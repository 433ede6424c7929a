//! Refresh lifecycle integration tests.
//!
//! These tests drive the scheduler, pipeline and cache store together:
//! startup bootstrap -> scheduled/manual refresh -> swap -> persist -> reload

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveTime, TimeZone, Timelike, Utc};
use tempfile::TempDir;

use marquee_core::{
    testing::{fixtures, MockMetadataSource},
    CacheStore, CatalogFetcher, DiscoverFilters, MetadataSource, QueryCombination, QueryService,
    RefreshPipeline, RefreshScheduler, RunOutcome, ScheduleConfig, SnapshotStorage,
};

/// Test helper wiring a mock source to a real store and scheduler.
struct TestHarness {
    source: Arc<MockMetadataSource>,
    store: Arc<CacheStore>,
    scheduler: RefreshScheduler,
    _temp_dir: TempDir,
}

impl TestHarness {
    async fn new(refresh_on_startup: bool) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        Self::with_storage(temp_dir, refresh_on_startup).await
    }

    async fn with_storage(temp_dir: TempDir, refresh_on_startup: bool) -> Self {
        let source = Arc::new(MockMetadataSource::new());
        seed_source(&source).await;

        let store = Arc::new(CacheStore::open(SnapshotStorage::new(temp_dir.path())));
        let fetcher = CatalogFetcher::new(
            Arc::clone(&source) as Arc<dyn MetadataSource>,
            DiscoverFilters::default(),
            5,
        );
        let pipeline = Arc::new(RefreshPipeline::new(
            fetcher,
            vec![action(), comedy()],
            Arc::clone(&store),
        ));

        // Keep the daily trigger out of the way of the tests.
        let config = ScheduleConfig {
            refresh_at: next_hour_far_from_now(),
            refresh_on_startup,
        };
        let scheduler = RefreshScheduler::new(config, chrono::Duration::hours(24), pipeline);

        Self {
            source,
            store,
            scheduler,
            _temp_dir: temp_dir,
        }
    }

    async fn wait_for_runs(&self, runs: u64) {
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
}

fn action() -> QueryCombination {
    QueryCombination::all_of(vec![28])
}

fn comedy() -> QueryCombination {
    QueryCombination::any_of(vec![35, 10749])
}

fn next_hour_far_from_now() -> NaiveTime {
    NaiveTime::from_hms_opt((Utc::now().hour() + 12) % 24, 0, 0).unwrap()
}

async fn seed_source(source: &MockMetadataSource) {
    source
        .set_pages(
            action(),
            vec![
                vec![
                    fixtures::discovered_movie(76341, "Mad Max: Fury Road", "2015-05-13"),
                    fixtures::discovered_movie(1726, "Iron Man", "2008-04-30"),
                ],
                vec![fixtures::discovered_movie(949, "Heat", "1995-12-15")],
            ],
        )
        .await;
    source
        .set_pages(
            comedy(),
            vec![vec![fixtures::discovered_movie(346698, "Barbie", "2023-07-19")]],
        )
        .await;
    for (id, title) in [
        (76341, "Mad Max: Fury Road"),
        (1726, "Iron Man"),
        (949, "Heat"),
        (346698, "Barbie"),
    ] {
        source.add_details(fixtures::movie_details(id, title)).await;
    }
}

#[tokio::test]
async fn test_startup_with_empty_storage_triggers_refresh() {
    let harness = TestHarness::new(true).await;
    assert!(harness.store.current().catalog.is_empty());
    assert!(harness.scheduler.needs_startup_refresh(Utc::now()));

    harness.scheduler.start().await;
    harness.wait_for_runs(1).await;

    let state = harness.store.current();
    let ids: Vec<u32> = state.catalog.entries.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![346698, 76341, 1726, 949]);
    assert_eq!(state.metadata.len(), 4);

    let status = harness.scheduler.status().await;
    assert!(status.running);
    assert_eq!(status.completed_runs, 1);
    match status.last_run.map(|r| r.outcome) {
        Some(RunOutcome::Succeeded { summary }) => {
            assert_eq!(summary.catalog_entries, 4);
            assert!(summary.persisted);
        }
        other => panic!("expected a successful run, got {:?}", other),
    }

    harness.scheduler.stop().await;
    assert!(!harness.scheduler.is_running());
}

#[tokio::test]
async fn test_corrupt_storage_bootstraps_from_nothing() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("catalog.json"), b"{{{").unwrap();
    std::fs::write(temp_dir.path().join("metadata.json"), b"garbage").unwrap();

    let harness = TestHarness::with_storage(temp_dir, true).await;
    assert!(harness.store.current().catalog.is_empty());
    assert!(harness.store.current().metadata.is_empty());

    harness.scheduler.start().await;
    harness.wait_for_runs(1).await;

    assert_eq!(harness.store.current().catalog.len(), 4);
    harness.scheduler.stop().await;
}

#[tokio::test]
async fn test_fresh_storage_skips_startup_refresh() {
    let temp_dir = TempDir::new().unwrap();
    let storage = SnapshotStorage::new(temp_dir.path());
    storage
        .save(&fixtures::cache_state(
            vec![fixtures::catalog_entry(1, "Cached", "2020-01-01")],
            Utc::now() - chrono::Duration::hours(1),
        ))
        .unwrap();

    let harness = TestHarness::with_storage(temp_dir, true).await;
    assert!(!harness.scheduler.needs_startup_refresh(Utc::now()));

    harness.scheduler.start().await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(harness.scheduler.completed_runs(), 0);
    assert_eq!(harness.source.discover_count().await, 0);
    assert_eq!(harness.store.current().catalog.entries[0].title, "Cached");
    harness.scheduler.stop().await;
}

#[tokio::test]
async fn test_stale_storage_triggers_refresh() {
    let temp_dir = TempDir::new().unwrap();
    let storage = SnapshotStorage::new(temp_dir.path());
    storage
        .save(&fixtures::cache_state(
            vec![fixtures::catalog_entry(1, "Cached", "2020-01-01")],
            Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
        ))
        .unwrap();

    let harness = TestHarness::with_storage(temp_dir, true).await;
    // Reads are served from the stale cache before the refresh lands.
    let query = QueryService::new(Arc::clone(&harness.store), "https://img", "tmdb");
    assert_eq!(query.search_catalog(None).len(), 1);

    harness.scheduler.start().await;
    harness.wait_for_runs(1).await;

    assert_eq!(query.search_catalog(None).len(), 4);
    // Metadata for the movie that left the catalog is retained.
    assert!(query.get_metadata("tmdb-1").is_some());
    harness.scheduler.stop().await;
}

#[tokio::test]
async fn test_triggers_during_run_coalesce_into_one_extra_run() {
    let harness = TestHarness::new(false).await;
    harness.scheduler.start().await;

    harness.source.pause().await;
    assert!(!harness.scheduler.trigger());
    harness.source.wait_for_discover().await;
    assert!(harness.scheduler.is_refreshing());

    // Two more triggers while the first run is held open.
    assert!(harness.scheduler.trigger());
    assert!(harness.scheduler.trigger());

    harness.source.resume().await;
    harness.wait_for_runs(2).await;

    // Give a hypothetical third run time to show up.
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(harness.scheduler.completed_runs(), 2);
    assert!(!harness.scheduler.is_refreshing());
    // Three discover calls per run (two action pages, one comedy page).
    assert_eq!(harness.source.discover_count().await, 6);

    harness.scheduler.stop().await;
}

#[tokio::test]
async fn test_readers_never_see_half_applied_refresh() {
    let temp_dir = TempDir::new().unwrap();
    let old_fetched_at = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    SnapshotStorage::new(temp_dir.path())
        .save(&fixtures::cache_state(
            vec![
                fixtures::catalog_entry(1, "Old One", "2010-01-01"),
                fixtures::catalog_entry(2, "Old Two", "2011-01-01"),
            ],
            old_fetched_at,
        ))
        .unwrap();

    let harness = TestHarness::with_storage(temp_dir, false).await;
    let store = Arc::clone(&harness.store);
    let done = Arc::new(AtomicBool::new(false));
    let samples = Arc::new(AtomicUsize::new(0));

    let reader = {
        let store = Arc::clone(&store);
        let done = Arc::clone(&done);
        let samples = Arc::clone(&samples);
        tokio::spawn(async move {
            while !done.load(Ordering::SeqCst) {
                let state = store.current();
                for entry in &state.catalog.entries {
                    let row = state
                        .metadata
                        .get(entry.id)
                        .unwrap_or_else(|| panic!("catalog entry {} without metadata", entry.id));
                    if state.catalog.fetched_at != Some(old_fetched_at) {
                        assert_eq!(Some(row.fetched_at), state.catalog.fetched_at);
                    }
                }
                samples.fetch_add(1, Ordering::SeqCst);
                tokio::task::yield_now().await;
            }
        })
    };

    harness.scheduler.start().await;
    harness.scheduler.trigger();
    harness.wait_for_runs(1).await;
    done.store(true, Ordering::SeqCst);

    reader.await.expect("reader observed an inconsistent state");
    assert!(samples.load(Ordering::SeqCst) > 0);
    assert_eq!(store.current().catalog.len(), 4);
    harness.scheduler.stop().await;
}

#[tokio::test]
async fn test_failed_run_keeps_previous_cache() {
    let temp_dir = TempDir::new().unwrap();
    let cached = fixtures::cache_state(
        vec![fixtures::catalog_entry(1, "Cached", "2020-01-01")],
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
    );
    SnapshotStorage::new(temp_dir.path()).save(&cached).unwrap();

    let harness = TestHarness::with_storage(temp_dir, false).await;
    harness.source.fail_all_pages().await;

    harness.scheduler.start().await;
    harness.scheduler.trigger();
    harness.wait_for_runs(1).await;

    assert_eq!(*harness.store.current(), cached);
    let status = harness.scheduler.status().await;
    assert!(matches!(
        status.last_run.map(|r| r.outcome),
        Some(RunOutcome::Failed { .. })
    ));

    // The next run retries from scratch.
    harness.source.clear_page_failures().await;
    harness.scheduler.trigger();
    harness.wait_for_runs(2).await;
    assert_eq!(harness.store.current().catalog.len(), 4);

    harness.scheduler.stop().await;
}

#[tokio::test]
async fn test_refresh_survives_restart() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().to_path_buf();

    let harness = TestHarness::with_storage(temp_dir, true).await;
    harness.scheduler.start().await;
    harness.wait_for_runs(1).await;
    harness.scheduler.stop().await;
    let before = harness.store.current();

    let reopened = CacheStore::open(SnapshotStorage::new(&path));
    assert_eq!(*reopened.current(), *before);
    assert!(!reopened.is_stale(Utc::now(), chrono::Duration::hours(24)));
}
