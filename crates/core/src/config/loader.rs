use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Load configuration from a TOML file, then apply environment overrides.
///
/// Overrides are named `MARQUEE_<SECTION>__<KEY>`; the double underscore
/// separates nesting levels, so `MARQUEE_TMDB__API_KEY` sets `tmdb.api_key`
/// and `MARQUEE_CACHE__STALENESS_HOURS` sets `cache.staleness_hours`.
/// Environment values win over the file.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("MARQUEE_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Parse configuration from a TOML string, without environment overrides.
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
