//! Refresh schedule configuration.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// When the catalog is refreshed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Daily refresh time, UTC, as "HH:MM" (default: "00:00").
    #[serde(default = "default_refresh_at", with = "hh_mm")]
    pub refresh_at: NaiveTime,
    /// Refresh at startup when the cache is missing or stale (default: true).
    #[serde(default = "default_true")]
    pub refresh_on_startup: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            refresh_at: default_refresh_at(),
            refresh_on_startup: true,
        }
    }
}

fn default_refresh_at() -> NaiveTime {
    NaiveTime::MIN
}

fn default_true() -> bool {
    true
}

mod hh_mm {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .map_err(|_| de::Error::custom(format!("invalid time '{}', expected HH:MM", raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: ScheduleConfig = toml::from_str("").unwrap();
        assert_eq!(config.refresh_at, NaiveTime::from_hms_opt(0, 0, 0).unwrap());
        assert!(config.refresh_on_startup);
    }

    #[test]
    fn test_parse_refresh_at() {
        let config: ScheduleConfig = toml::from_str(
            r#"
refresh_at = "03:30"
refresh_on_startup = false
"#,
        )
        .unwrap();
        assert_eq!(config.refresh_at, NaiveTime::from_hms_opt(3, 30, 0).unwrap());
        assert!(!config.refresh_on_startup);
    }

    #[test]
    fn test_invalid_refresh_at() {
        let result: Result<ScheduleConfig, _> = toml::from_str(r#"refresh_at = "25:99""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_serializes_as_hh_mm() {
        let config = ScheduleConfig {
            refresh_at: NaiveTime::from_hms_opt(4, 5, 0).unwrap(),
            refresh_on_startup: true,
        };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["refresh_at"], "04:05");
    }
}
