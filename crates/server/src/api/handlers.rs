//! Operational endpoints: health, status, config and manual refresh.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use marquee_core::{CacheStats, SanitizedConfig, SchedulerStatus};

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Cache contents and scheduler state
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub cache: CacheStats,
    pub stale: bool,
    pub scheduler: SchedulerStatus,
}

pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let staleness = state.config().cache.staleness();
    Json(StatusResponse {
        cache: state.store().stats(),
        stale: state.store().is_stale(chrono::Utc::now(), staleness),
        scheduler: state.scheduler().status().await,
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

/// Response for a manual refresh request
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub accepted: bool,
    /// True when a run was already in flight; the request is served by
    /// one follow-up run shared with any other requests made meanwhile.
    pub queued_behind_running: bool,
}

pub async fn trigger_refresh(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<RefreshResponse>) {
    let queued_behind_running = state.scheduler().trigger();
    info!(queued_behind_running, "Manual refresh requested");
    (
        StatusCode::ACCEPTED,
        Json(RefreshResponse {
            accepted: true,
            queued_behind_running,
        }),
    )
}
