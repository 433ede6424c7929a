//! Cache refresh: the pipeline that rebuilds the cache from TMDB and the
//! scheduler that runs it once a day.

mod config;
mod pipeline;
mod scheduler;
mod types;

pub use config::ScheduleConfig;
pub use pipeline::{sort_by_release_desc, RefreshPipeline};
pub use scheduler::{next_deadline, next_occurrence, RefreshScheduler};
pub use types::{RefreshError, RefreshSummary, RunOutcome, RunRecord, SchedulerStatus};
