//! Runtime configuration read from the environment (and `.env` via `dotenvy`).

use anyhow::{Context, Result, anyhow};
use std::path::PathBuf;

pub const DEFAULT_MODEL_PATH: &str = "demand_prediction_xgboost.json";
pub const DEFAULT_DIRECTIONS_URL: &str = "https://maps.googleapis.com/maps/api/directions/json";
pub const DEFAULT_LOG_FILE: &str = "logs/commuter_demand.log";

/// Settings shared by every subcommand.
///
/// | Variable                    | Default                          |
/// |-----------------------------|----------------------------------|
/// | `DEMAND_MODEL_PATH`         | `demand_prediction_xgboost.json` |
/// | `GOOGLE_MAPS_API_KEY`       | unset                            |
/// | `DIRECTIONS_BASE_URL`       | Google Directions JSON endpoint  |
/// | `HTTP_TIMEOUT_SECS`         | `30`                             |
/// | `HTTP_CONNECT_TIMEOUT_SECS` | `10`                             |
/// | `LOG_FILE_PATH`             | `logs/commuter_demand.log`       |
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub model_path: PathBuf,
    pub maps_api_key: Option<String>,
    pub directions_base_url: String,
    pub http_timeout_secs: u64,
    pub http_connect_timeout_secs: u64,
    pub log_file_path: PathBuf,
}

impl AppConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let secs = |name: &str, default: u64| -> Result<u64> {
            match non_empty(name) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .with_context(|| format!("{name} must be a whole number of seconds, got '{raw}'")),
                None => Ok(default),
            }
        };

        Ok(Self {
            model_path: non_empty("DEMAND_MODEL_PATH")
                .unwrap_or_else(|| DEFAULT_MODEL_PATH.to_string())
                .into(),
            maps_api_key: non_empty("GOOGLE_MAPS_API_KEY"),
            directions_base_url: non_empty("DIRECTIONS_BASE_URL")
                .unwrap_or_else(|| DEFAULT_DIRECTIONS_URL.to_string()),
            http_timeout_secs: secs("HTTP_TIMEOUT_SECS", 30)?,
            http_connect_timeout_secs: secs("HTTP_CONNECT_TIMEOUT_SECS", 10)?,
            log_file_path: non_empty("LOG_FILE_PATH")
                .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string())
                .into(),
        })
    }

    /// Returns the maps API key, failing when it is not configured.
    pub fn require_maps_api_key(&self) -> Result<&str> {
        self.maps_api_key
            .as_deref()
            .ok_or_else(|| anyhow!("GOOGLE_MAPS_API_KEY must be set to query live routes"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.model_path, PathBuf::from(DEFAULT_MODEL_PATH));
        assert_eq!(config.directions_base_url, DEFAULT_DIRECTIONS_URL);
        assert_eq!(config.http_timeout_secs, 30);
        assert_eq!(config.http_connect_timeout_secs, 10);
        assert!(config.maps_api_key.is_none());
        assert!(config.require_maps_api_key().is_err());
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = config_from(&[
            ("DEMAND_MODEL_PATH", "/models/demand.json"),
            ("GOOGLE_MAPS_API_KEY", "secret"),
            ("HTTP_TIMEOUT_SECS", " 5 "),
        ])
        .unwrap();

        assert_eq!(config.model_path, PathBuf::from("/models/demand.json"));
        assert_eq!(config.require_maps_api_key().unwrap(), "secret");
        assert_eq!(config.http_timeout_secs, 5);
    }

    #[test]
    fn test_blank_api_key_counts_as_missing() {
        let config = config_from(&[("GOOGLE_MAPS_API_KEY", "   ")]).unwrap();
        assert!(config.maps_api_key.is_none());
    }

    #[test]
    fn test_malformed_timeout_is_rejected() {
        let err = config_from(&[("HTTP_TIMEOUT_SECS", "soon")]).unwrap_err();
        assert!(err.to_string().contains("HTTP_TIMEOUT_SECS"));
    }
}
