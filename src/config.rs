use crate::map::MarkerPolicy;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub refresh: RefreshConfig,
    pub map: MapConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Backend root; `/api/data` is appended
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct RefreshConfig {
    /// Seconds between refresh cycles, 0 = fetch once at startup
    pub interval_secs: u64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct MapConfig {
    /// Directory holding Natural Earth GeoJSON files
    pub data_dir: Option<PathBuf>,
    pub marker_policy: MarkerPolicy,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            data_dir: Some(PathBuf::from("data")),
            marker_policy: MarkerPolicy::Replace,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, used when `RUST_LOG` is unset
    pub filter: String,
    /// Also append log lines to this file
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            file: None,
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse TOML configuration")
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.server.timeout_secs.max(1))
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        match self.refresh.interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.server.base_url, "http://127.0.0.1:5000");
        assert_eq!(config.refresh_interval(), None);
        assert_eq!(config.map.marker_policy, MarkerPolicy::Replace);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_toml(
            r#"
            [server]
            base_url = "http://aqi.local:8080"

            [refresh]
            interval_secs = 30

            [map]
            data_dir = "/srv/ne"
            marker_policy = "accumulate"

            [logging]
            filter = "aqi_dash=debug"
            file = "dash.log"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.base_url, "http://aqi.local:8080");
        assert_eq!(config.server.timeout_secs, 10);
        assert_eq!(config.refresh_interval(), Some(Duration::from_secs(30)));
        assert_eq!(config.map.data_dir, Some(PathBuf::from("/srv/ne")));
        assert_eq!(config.map.marker_policy, MarkerPolicy::Accumulate);
        assert_eq!(config.logging.file, Some(PathBuf::from("dash.log")));
    }

    #[test]
    fn test_rejects_unknown_policy() {
        assert!(AppConfig::from_toml("[map]\nmarker_policy = \"sometimes\"").is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = AppConfig::load_from_file(Path::new("/nonexistent/aqi-dash.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to read config file"));
    }
}
