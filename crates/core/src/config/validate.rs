use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - TMDB API key is set
/// - Page cap is at least 1 and at least one combination exists
/// - Release date range is ordered
/// - Staleness threshold is positive
/// - Addon id prefix is non-empty
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.tmdb.api_key.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "tmdb.api_key is required".to_string(),
        ));
    }

    // Discover validation
    let discover = &config.discover;
    if discover.page_cap == 0 {
        return Err(ConfigError::ValidationError(
            "discover.page_cap must be at least 1".to_string(),
        ));
    }
    if discover.combinations.is_empty() {
        return Err(ConfigError::ValidationError(
            "discover.combinations cannot be empty".to_string(),
        ));
    }
    if let (Some(gte), Some(lte)) = (
        discover.filters.release_date_gte,
        discover.filters.release_date_lte,
    ) {
        if gte > lte {
            return Err(ConfigError::ValidationError(format!(
                "discover.release_date_gte ({}) is after release_date_lte ({})",
                gte, lte
            )));
        }
    }

    if config.cache.staleness_hours == 0 {
        return Err(ConfigError::ValidationError(
            "cache.staleness_hours must be at least 1".to_string(),
        ));
    }

    if config.addon.id_prefix.is_empty() || config.addon.id_prefix.contains('-') {
        return Err(ConfigError::ValidationError(
            "addon.id_prefix must be non-empty and cannot contain '-'".to_string(),
        ));
    }

    Ok(())
}
