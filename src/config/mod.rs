use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Content store (publications, releases, pages, files)
    pub content_database_path: PathBuf,

    /// Statistics store (subjects, footnotes)
    pub statistics_database_path: PathBuf,

    /// Root directory for uploaded blobs
    pub blob_storage_path: PathBuf,

    /// Base URL of the notifier endpoint; notifications are skipped when
    /// unset
    #[serde(default)]
    pub notifier_endpoint: Option<String>,

    /// Fallback acting user for mutations when --actor is not given
    #[serde(default)]
    pub default_actor: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let default_data_path = match ProjectDirs::from("net", "statdesk", "statdesk") {
            Some(project_dirs) => project_dirs.data_dir().to_path_buf(),
            None => {
                // Graceful fallback to current directory if project dirs unavailable
                warn!("ProjectDirs unavailable; falling back to current directory for data path");
                PathBuf::from(".")
            }
        };

        Self {
            content_database_path: default_data_path.join("content.db"),
            statistics_database_path: default_data_path.join("statistics.db"),
            blob_storage_path: default_data_path.join("blobs"),
            notifier_endpoint: None,
            default_actor: None,
        }
    }
}

impl Config {
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        // Try to load .env file if it exists (for deployment and development)
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        let config_file = if let Some(path) = config_path {
            PathBuf::from(path)
        } else {
            Self::default_config_path()?
        };

        if config_file.exists() {
            let content = fs::read_to_string(&config_file)?;
            let file_config: Config = toml::from_str(&content)?;
            config = file_config;
        }

        // Environment variables have the highest priority
        config.load_from_env();
        config.validate()?;

        // Ensure data directories exist
        for path in [
            &config.content_database_path,
            &config.statistics_database_path,
        ] {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::create_dir_all(&config.blob_storage_path)?;

        // Save config file if it doesn't exist
        if !config_file.exists() {
            if let Some(parent) = config_file.parent() {
                fs::create_dir_all(parent)?;
            }
            config.save(&config_file)?;
        }

        Ok(config)
    }

    /// Load configuration from environment variables
    fn load_from_env(&mut self) {
        if let Ok(path) = env::var("STATDESK_CONTENT_DATABASE_PATH") {
            self.content_database_path = PathBuf::from(path);
        }

        if let Ok(path) = env::var("STATDESK_STATISTICS_DATABASE_PATH") {
            self.statistics_database_path = PathBuf::from(path);
        }

        if let Ok(path) = env::var("STATDESK_BLOB_STORAGE_PATH") {
            self.blob_storage_path = PathBuf::from(path);
        }

        if let Ok(endpoint) = env::var("STATDESK_NOTIFIER_ENDPOINT") {
            let trimmed = endpoint.trim().to_string();
            if !trimmed.is_empty() {
                self.notifier_endpoint = Some(trimmed);
            } else {
                self.notifier_endpoint = None;
            }
        }

        if let Ok(actor) = env::var("STATDESK_ACTOR") {
            let trimmed = actor.trim().to_string();
            if !trimmed.is_empty() {
                self.default_actor = Some(trimmed);
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if let Some(endpoint) = &self.notifier_endpoint {
            if Url::parse(endpoint).is_err() {
                return Err(ConfigError::InvalidValue {
                    field: "notifier_endpoint".to_string(),
                    value: endpoint.clone(),
                }
                .into());
            }
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    fn default_config_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("net", "statdesk", "statdesk")
            .ok_or_else(|| anyhow::anyhow!("Failed to determine project directories"))?;

        Ok(project_dirs.config_dir().join("config.toml"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Self::default_config_path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths_share_the_data_directory() {
        let config = Config::default();
        assert_eq!(
            config.content_database_path.parent(),
            config.statistics_database_path.parent()
        );
        assert!(config.notifier_endpoint.is_none());
    }

    #[test]
    fn test_validate_rejects_malformed_endpoint() {
        let config = Config {
            notifier_endpoint: Some("not a url".to_string()),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            notifier_endpoint: Some("https://notify.example.test/api/".to_string()),
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }
}
