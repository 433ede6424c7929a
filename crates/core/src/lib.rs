pub mod cache;
pub mod config;
pub mod query;
pub mod refresh;
pub mod testing;
pub mod tmdb;

pub use cache::{
    CacheConfig, CacheState, CacheStats, CacheStore, CatalogSnapshot, MetadataEntry,
    MetadataTable, SnapshotStorage, StorageError,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
    ServerConfig,
};
pub use query::{AddonConfig, CatalogSummary, MetadataView, QueryService};
pub use refresh::{
    RefreshError, RefreshPipeline, RefreshScheduler, RefreshSummary, RunOutcome, RunRecord,
    ScheduleConfig, SchedulerStatus,
};
pub use tmdb::{
    CatalogEntry, CatalogFetcher, DiscoverConfig, DiscoverFilters, FetchError, MetadataRecord,
    MetadataSource, MovieDetails, QueryCombination, TmdbClient, TmdbConfig,
};
