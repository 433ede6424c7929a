use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::cache::CacheConfig;
use crate::query::AddonConfig;
use crate::refresh::ScheduleConfig;
use crate::tmdb::{DiscoverConfig, TmdbConfig};

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub tmdb: TmdbConfig,
    #[serde(default)]
    pub discover: DiscoverConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub addon: AddonConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    7000
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub tmdb: SanitizedTmdbConfig,
    pub discover: DiscoverConfig,
    pub cache: CacheConfig,
    pub schedule: ScheduleConfig,
    pub addon: AddonConfig,
}

/// Sanitized TMDB config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTmdbConfig {
    pub api_key_configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub image_base_url: String,
    pub language: String,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            tmdb: SanitizedTmdbConfig {
                api_key_configured: !config.tmdb.api_key.is_empty(),
                base_url: config.tmdb.base_url.clone(),
                image_base_url: config.tmdb.image_base_url(),
                language: config.tmdb.language.clone(),
                timeout_secs: config.tmdb.timeout_secs,
            },
            discover: config.discover.clone(),
            cache: config.cache.clone(),
            schedule: config.schedule.clone(),
            addon: config.addon.clone(),
        }
    }
}
