//! Connector configuration loaded from YAML

use sap_cache::{CacheLayout, LoaderConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors raised while reading or validating the configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Configuration error: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        "CONFIGURATION"
    }
}

/// Settings for one backend system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorConfig {
    /// Backend system id, also the name of the per-system cache directory
    pub system_id: String,
    pub cache_dir: PathBuf,
    /// Directory of recorded function responses replayed instead of a live
    /// connection
    pub fixtures_dir: Option<PathBuf>,
    pub poll_interval_ms: u64,
    pub log_filter: String,
    /// Character lengths reported by the backend are in UTF-16 code units
    pub unicode: bool,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            system_id: String::new(),
            cache_dir: PathBuf::from(".sapmeta"),
            fixtures_dir: None,
            poll_interval_ms: 500,
            log_filter: "info".to_string(),
            unicode: true,
        }
    }
}

impl ConnectorConfig {
    pub fn from_yaml_str(text: &str, path: &Path) -> Result<Self, ConfigError> {
        serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text, path)
    }

    /// Apply command-line values over the file values
    pub fn with_overrides(
        mut self,
        system_id: Option<String>,
        cache_dir: Option<PathBuf>,
        fixtures_dir: Option<PathBuf>,
    ) -> Self {
        if let Some(system_id) = system_id {
            self.system_id = system_id;
        }
        if let Some(cache_dir) = cache_dir {
            self.cache_dir = cache_dir;
        }
        if fixtures_dir.is_some() {
            self.fixtures_dir = fixtures_dir;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.system_id.trim().is_empty() {
            return Err(ConfigError::Invalid("system_id must not be empty".to_string()));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn fixtures_dir(&self) -> Result<&Path, ConfigError> {
        self.fixtures_dir.as_deref().ok_or_else(|| {
            ConfigError::Invalid(format!(
                "system '{}' has no fixtures_dir to answer remote calls",
                self.system_id
            ))
        })
    }

    pub fn layout(&self) -> CacheLayout {
        CacheLayout::for_system(&self.cache_dir, &self.system_id)
    }

    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig::new(self.layout().root())
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<ConnectorConfig, ConfigError> {
        ConnectorConfig::from_yaml_str(text, Path::new("sapmeta.yaml"))
    }

    #[test]
    fn missing_values_take_defaults() {
        let config = parse("system_id: PRD\n").unwrap();
        assert_eq!(config.system_id, "PRD");
        assert_eq!(config.poll_interval_ms, 500);
        assert_eq!(config.cache_dir, PathBuf::from(".sapmeta"));
        assert!(config.unicode);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_system_id_is_rejected() {
        let config = parse("cache_dir: /tmp/cache\n").unwrap();
        let error = config.validate().unwrap_err();
        assert_eq!(error.code(), "CONFIGURATION");
        assert!(error.to_string().contains("system_id"));
    }

    #[test]
    fn flags_override_file_values() {
        let config = parse("system_id: DEV\nfixtures_dir: /srv/fixtures\n")
            .unwrap()
            .with_overrides(Some("QAS".to_string()), Some(PathBuf::from("/var/cache")), None);
        assert_eq!(config.system_id, "QAS");
        assert_eq!(config.fixtures_dir, Some(PathBuf::from("/srv/fixtures")));
        assert_eq!(config.layout().root(), Path::new("/var/cache/QAS"));
        assert_eq!(
            config.loader_config().poll_interval,
            Duration::from_millis(500)
        );
    }

    #[test]
    fn malformed_yaml_names_the_file() {
        let error = parse("system_id: [unclosed").unwrap_err();
        assert!(matches!(error, ConfigError::Parse { .. }));
        assert!(error.to_string().contains("sapmeta.yaml"));
    }

    #[test]
    fn fixtures_are_required_to_answer_calls() {
        let config = parse("system_id: DEV\n").unwrap();
        assert!(config.fixtures_dir().is_err());
    }
}
