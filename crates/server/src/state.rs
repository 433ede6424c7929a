use std::sync::Arc;

use marquee_core::{CacheStore, Config, QueryService, RefreshScheduler, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    query: QueryService,
    store: Arc<CacheStore>,
    scheduler: Arc<RefreshScheduler>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<CacheStore>, scheduler: Arc<RefreshScheduler>) -> Self {
        let query = QueryService::new(
            Arc::clone(&store),
            &config.tmdb.image_base_url(),
            &config.addon.id_prefix,
        );
        Self {
            config,
            query,
            store,
            scheduler,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn query(&self) -> &QueryService {
        &self.query
    }

    pub fn store(&self) -> &CacheStore {
        self.store.as_ref()
    }

    pub fn scheduler(&self) -> &RefreshScheduler {
        self.scheduler.as_ref()
    }
}
