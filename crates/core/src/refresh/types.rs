//! Types for refresh runs and scheduler status.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// A refresh run that was abandoned; the previous cache stays in place.
#[derive(Debug, Error)]
pub enum RefreshError {
    /// Every discover query came back empty or failed while the cache holds
    /// a non-empty catalog.
    #[error("Refresh produced an empty catalog, keeping {previous_entries} cached entries")]
    EmptyCatalog { previous_entries: usize },

    /// The refresh task panicked.
    #[error("Refresh task failed: {0}")]
    TaskFailed(String),
}

/// Outcome of a successful refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshSummary {
    pub fetched_at: DateTime<Utc>,
    pub catalog_entries: usize,
    pub metadata_fetched: usize,
    pub metadata_failed: usize,
    /// Metadata table size after the merge.
    pub metadata_entries: usize,
    /// Whether the snapshot reached durable storage.
    pub persisted: bool,
    pub duration_ms: u64,
}

/// Outcome of a run, as kept by the scheduler.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum RunOutcome {
    Succeeded { summary: RefreshSummary },
    Failed { error: String },
}

/// The last finished run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRecord {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(flatten)]
    pub outcome: RunOutcome,
}

/// Current scheduler status.
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub running: bool,
    pub refresh_in_flight: bool,
    pub completed_runs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_scheduled: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_run: Option<RunRecord>,
}
