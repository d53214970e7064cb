//! Configuration loading
//!
//! Resolution order: explicit path, `./config/tagsync.yaml`,
//! `<config dir>/tagsync/config.yaml`, then built-in defaults. Environment
//! overrides are applied last.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tagsync_catalog_client::HttpCatalogConfig;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

const ENV_ENDPOINT: &str = "TAGSYNC_CATALOG_ENDPOINT";
const ENV_REGION: &str = "TAGSYNC_CATALOG_REGION";
const ENV_CONCURRENCY: &str = "TAGSYNC_PROPAGATION_CONCURRENCY";
const ENV_LOG_LEVEL: &str = "TAGSYNC_LOG_LEVEL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error reading {path}: {message}")]
    Io { path: PathBuf, message: String },
    #[error("invalid config {path}: {message}")]
    Invalid { path: PathBuf, message: String },
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// Explicit endpoint; when unset the regional endpoint is used.
    pub endpoint: Option<String>,
    pub region: String,
    pub request_timeout_ms: u64,
    pub page_size: u32,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            region: "us-east-1".to_string(),
            request_timeout_ms: 10_000,
            page_size: 20,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropagationSettings {
    pub concurrency: usize,
}

impl Default for PropagationSettings {
    fn default() -> Self {
        Self { concurrency: 8 }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagSyncConfig {
    pub catalog: CatalogSettings,
    pub propagation: PropagationSettings,
    pub log_level: String,
}

impl Default for TagSyncConfig {
    fn default() -> Self {
        Self {
            catalog: CatalogSettings::default(),
            propagation: PropagationSettings::default(),
            log_level: "info".to_string(),
        }
    }
}

impl TagSyncConfig {
    pub fn http_client_config(&self) -> Result<HttpCatalogConfig, ConfigError> {
        let mut config = match &self.catalog.endpoint {
            Some(raw) => {
                let endpoint = Url::parse(raw).map_err(|err| ConfigError::InvalidValue {
                    name: "catalog.endpoint".into(),
                    message: err.to_string(),
                })?;
                HttpCatalogConfig {
                    endpoint,
                    timeout: Duration::from_secs(10),
                    page_size: 20,
                }
            }
            None => HttpCatalogConfig::for_region(&self.catalog.region).map_err(|err| {
                ConfigError::InvalidValue {
                    name: "catalog.region".into(),
                    message: err.to_string(),
                }
            })?,
        };
        config.timeout = Duration::from_millis(self.catalog.request_timeout_ms);
        config.page_size = self.catalog.page_size.max(1);
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(endpoint) = non_empty_var(ENV_ENDPOINT) {
            self.catalog.endpoint = Some(endpoint);
        }
        if let Some(region) = non_empty_var(ENV_REGION) {
            self.catalog.region = region;
        }
        if let Some(raw) = non_empty_var(ENV_CONCURRENCY) {
            let concurrency = raw
                .parse::<usize>()
                .ok()
                .filter(|value| *value > 0)
                .ok_or_else(|| ConfigError::InvalidValue {
                    name: ENV_CONCURRENCY.into(),
                    message: format!("expected a positive integer, got {raw:?}"),
                })?;
            self.propagation.concurrency = concurrency;
        }
        if let Some(level) = non_empty_var(ENV_LOG_LEVEL) {
            self.log_level = level;
        }
        Ok(())
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub struct LoadedConfig {
    pub config: TagSyncConfig,
    /// File the configuration came from, if one existed.
    pub path: Option<PathBuf>,
}

fn default_config_path() -> Option<PathBuf> {
    let local = PathBuf::from("config/tagsync.yaml");
    if local.exists() {
        return Some(local);
    }
    dirs::config_dir().map(|mut path| {
        path.push("tagsync");
        path.push("config.yaml");
        path
    })
}

fn read_config_file(path: &Path) -> Result<TagSyncConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|err| ConfigError::Io {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    serde_yaml::from_str(&content).map_err(|err| ConfigError::Invalid {
        path: path.to_path_buf(),
        message: err.to_string(),
    })
}

pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
    let candidate = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => default_config_path(),
    };

    let (mut config, path) = match candidate {
        Some(path) if path.exists() => {
            let config = read_config_file(&path)?;
            info!(path = %path.display(), "loaded configuration");
            (config, Some(path))
        }
        Some(path) if explicit.is_some() => {
            return Err(ConfigError::Io {
                message: "file not found".into(),
                path,
            });
        }
        Some(path) => {
            warn!(path = %path.display(), "config file not found, using defaults");
            (TagSyncConfig::default(), None)
        }
        None => (TagSyncConfig::default(), None),
    };

    config.apply_env_overrides()?;
    Ok(LoadedConfig { config, path })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for name in [ENV_ENDPOINT, ENV_REGION, ENV_CONCURRENCY, ENV_LOG_LEVEL] {
            env::remove_var(name);
        }
    }

    #[test]
    #[serial]
    fn file_values_fill_missing_fields_with_defaults() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tagsync.yaml");
        fs::write(
            &path,
            "catalog:\n  endpoint: http://localhost:4566/\n  page_size: 5\npropagation:\n  concurrency: 2\n",
        )
        .unwrap();

        let loaded = load_config(Some(&path)).unwrap();
        assert_eq!(loaded.path.as_deref(), Some(path.as_path()));
        let config = loaded.config;
        assert_eq!(config.catalog.page_size, 5);
        assert_eq!(config.catalog.region, "us-east-1");
        assert_eq!(config.catalog.request_timeout_ms, 10_000);
        assert_eq!(config.propagation.concurrency, 2);

        let http = config.http_client_config().unwrap();
        assert_eq!(http.endpoint.as_str(), "http://localhost:4566/");
        assert_eq!(http.page_size, 5);
    }

    #[test]
    #[serial]
    fn env_overrides_win_over_file() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tagsync.yaml");
        fs::write(&path, "catalog:\n  region: eu-west-1\nlog_level: warn\n").unwrap();

        env::set_var(ENV_REGION, "ap-southeast-2");
        env::set_var(ENV_CONCURRENCY, "16");
        let config = load_config(Some(&path)).unwrap().config;
        clear_env();

        assert_eq!(config.catalog.region, "ap-southeast-2");
        assert_eq!(config.propagation.concurrency, 16);
        assert_eq!(config.log_level, "warn");
        assert_eq!(
            config.http_client_config().unwrap().endpoint.as_str(),
            "https://servicecatalog.ap-southeast-2.amazonaws.com/"
        );
    }

    #[test]
    #[serial]
    fn zero_concurrency_is_rejected() {
        clear_env();
        env::set_var(ENV_CONCURRENCY, "0");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.yaml");
        fs::write(&path, "{}\n").unwrap();
        let err = load_config(Some(&path)).err().expect("invalid concurrency");
        clear_env();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    #[serial]
    fn missing_explicit_file_is_an_error() {
        clear_env();
        let err = load_config(Some(Path::new("/nonexistent/tagsync.yaml")))
            .err()
            .expect("missing file");
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
