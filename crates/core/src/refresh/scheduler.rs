//! Daily refresh scheduler.
//!
//! A single worker task runs the pipeline. Triggers (daily timer, startup
//! staleness check, manual requests) wake it through a [`Notify`], which
//! holds at most one pending permit: any number of triggers arriving during
//! a run collapse into one follow-up run, and two runs never overlap.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, NaiveTime, Utc};
use tokio::sync::{broadcast, Notify, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::config::ScheduleConfig;
use super::pipeline::RefreshPipeline;
use super::types::{RefreshError, RunOutcome, RunRecord, SchedulerStatus};

/// How long `stop` waits for a busy worker before detaching it.
const STOP_GRACE: Duration = Duration::from_secs(5);

/// Next daily occurrence of `at` strictly after `now`.
pub fn next_occurrence(now: DateTime<Utc>, at: NaiveTime) -> DateTime<Utc> {
    let today = now.date_naive().and_time(at).and_utc();
    if today > now {
        today
    } else {
        today + chrono::Duration::days(1)
    }
}

/// Deadline for the timer's next wake-up.
///
/// The timer sleeps on the monotonic clock while deadlines come from the
/// wall clock, so it can wake with `now` slightly before the deadline that
/// just fired. Never returning a deadline at or before `last_fired` keeps
/// one daily trigger per day.
pub fn next_deadline(
    now: DateTime<Utc>,
    last_fired: Option<DateTime<Utc>>,
    at: NaiveTime,
) -> DateTime<Utc> {
    let reference = match last_fired {
        Some(fired) if fired > now => fired,
        _ => now,
    };
    next_occurrence(reference, at)
}

/// Drives [`RefreshPipeline`] on a daily cadence.
pub struct RefreshScheduler {
    config: ScheduleConfig,
    staleness: chrono::Duration,
    pipeline: Arc<RefreshPipeline>,
    stop_grace: Duration,

    // Runtime state
    wake: Arc<Notify>,
    running: Arc<AtomicBool>,
    in_flight: Arc<AtomicBool>,
    completed_runs: Arc<AtomicU64>,
    last_run: Arc<RwLock<Option<RunRecord>>>,
    next_scheduled: Arc<RwLock<Option<DateTime<Utc>>>>,
    shutdown_tx: broadcast::Sender<()>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl RefreshScheduler {
    /// Create a new scheduler.
    pub fn new(
        config: ScheduleConfig,
        staleness: chrono::Duration,
        pipeline: Arc<RefreshPipeline>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            staleness,
            pipeline,
            stop_grace: STOP_GRACE,
            wake: Arc::new(Notify::new()),
            running: Arc::new(AtomicBool::new(false)),
            in_flight: Arc::new(AtomicBool::new(false)),
            completed_runs: Arc::new(AtomicU64::new(0)),
            last_run: Arc::new(RwLock::new(None)),
            next_scheduled: Arc::new(RwLock::new(None)),
            shutdown_tx,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Start the worker and the daily timer, and trigger a refresh right away
    /// if the cache is empty or stale.
    ///
    /// If a previous `stop` left a run finishing in the background, this
    /// waits for it first so two workers never share the trigger.
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Refresh scheduler already running");
            return;
        }

        let leftover = std::mem::take(
            &mut *self
                .tasks
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        if !leftover.is_empty() {
            info!("Waiting for the previous refresh to finish before starting");
            for task in leftover {
                let _ = task.await;
            }
        }

        info!(
            "Starting refresh scheduler (daily at {} UTC)",
            self.config.refresh_at.format("%H:%M")
        );

        let worker = self.spawn_worker();
        let timer = self.spawn_timer();
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend([worker, timer]);

        if self.config.refresh_on_startup && self.needs_startup_refresh(Utc::now()) {
            info!("Cache is empty or stale, refreshing now");
            self.trigger();
        }
    }

    /// Stop the timer and the worker. A run in progress is not interrupted.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Refresh scheduler not running");
            return;
        }

        info!("Stopping refresh scheduler");
        let _ = self.shutdown_tx.send(());

        let tasks = std::mem::take(
            &mut *self
                .tasks
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        let mut detached = Vec::new();
        for mut task in tasks {
            if tokio::time::timeout(self.stop_grace, &mut task).await.is_err() {
                warn!("Refresh still in progress, leaving it to finish in the background");
                detached.push(task);
            }
        }
        // Kept so a later `start` can wait for them.
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(detached);

        info!("Refresh scheduler stopped");
    }

    /// Request a refresh.
    ///
    /// Returns true when a run is already in flight, in which case this
    /// request is queued behind it (and merged with other queued requests).
    pub fn trigger(&self) -> bool {
        self.wake.notify_one();
        let queued = self.in_flight.load(Ordering::SeqCst);
        debug!("Refresh triggered (queued behind running refresh: {})", queued);
        queued
    }

    /// True when the cache is missing or older than the staleness threshold.
    pub fn needs_startup_refresh(&self, now: DateTime<Utc>) -> bool {
        self.pipeline.store().is_stale(now, self.staleness)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn is_refreshing(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Number of finished runs, successful or not.
    pub fn completed_runs(&self) -> u64 {
        self.completed_runs.load(Ordering::SeqCst)
    }

    /// Get current scheduler status.
    pub async fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            running: self.is_running(),
            refresh_in_flight: self.is_refreshing(),
            completed_runs: self.completed_runs(),
            next_scheduled: *self.next_scheduled.read().await,
            last_run: self.last_run.read().await.clone(),
        }
    }

    fn spawn_worker(&self) -> JoinHandle<()> {
        let pipeline = Arc::clone(&self.pipeline);
        let wake = Arc::clone(&self.wake);
        let in_flight = Arc::clone(&self.in_flight);
        let completed_runs = Arc::clone(&self.completed_runs);
        let last_run = Arc::clone(&self.last_run);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        debug!("Refresh worker received shutdown signal");
                        break;
                    }
                    _ = wake.notified() => {}
                }

                in_flight.store(true, Ordering::SeqCst);
                let started_at = Utc::now();

                // Run in its own task so a panic is contained to this run.
                let run_pipeline = Arc::clone(&pipeline);
                let result = match tokio::spawn(async move { run_pipeline.run().await }).await {
                    Ok(result) => result,
                    Err(e) => Err(RefreshError::TaskFailed(e.to_string())),
                };

                let outcome = match result {
                    Ok(summary) => RunOutcome::Succeeded { summary },
                    Err(e) => {
                        error!("Catalog refresh abandoned, keeping previous cache: {}", e);
                        RunOutcome::Failed {
                            error: e.to_string(),
                        }
                    }
                };

                *last_run.write().await = Some(RunRecord {
                    started_at,
                    finished_at: Utc::now(),
                    outcome,
                });
                completed_runs.fetch_add(1, Ordering::SeqCst);
                in_flight.store(false, Ordering::SeqCst);
            }
        })
    }

    fn spawn_timer(&self) -> JoinHandle<()> {
        let refresh_at = self.config.refresh_at;
        let wake = Arc::clone(&self.wake);
        let next_scheduled = Arc::clone(&self.next_scheduled);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let mut last_fired = None;
            loop {
                let now = Utc::now();
                let next = next_deadline(now, last_fired, refresh_at);
                *next_scheduled.write().await = Some(next);
                let wait = (next - now).to_std().unwrap_or_default();
                debug!("Next scheduled refresh at {}", next);

                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        debug!("Refresh timer received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(wait) => {
                        info!("Scheduled catalog refresh");
                        last_fired = Some(next);
                        wake.notify_one();
                    }
                }
            }
        })
    }
}
