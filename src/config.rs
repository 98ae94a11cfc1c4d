//! Configuration Management
//!
//! Handles persistent configuration storage for phcloud.

use crate::api::DEFAULT_BASE_URL;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// API base URL override
    #[serde(default)]
    pub api_url: Option<String>,
}

impl Config {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("phcloud").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Get effective API base URL (CLI > env > config > default)
    pub fn effective_api_url(&self, cli_override: Option<&str>) -> String {
        self.api_url_from(cli_override, std::env::var("PIDGINHOST_API_URL").ok())
    }

    fn api_url_from(&self, cli_override: Option<&str>, env_override: Option<String>) -> String {
        cli_override
            .map(str::to_string)
            .or(env_override)
            .or_else(|| self.api_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_override_wins() {
        let config = Config {
            api_url: Some("https://stored.example".to_string()),
        };
        assert_eq!(
            config.api_url_from(
                Some("https://cli.example"),
                Some("https://env.example".to_string())
            ),
            "https://cli.example"
        );
    }

    #[test]
    fn env_beats_stored_config() {
        let config = Config {
            api_url: Some("https://stored.example".to_string()),
        };
        assert_eq!(
            config.api_url_from(None, Some("https://env.example".to_string())),
            "https://env.example"
        );
    }

    #[test]
    fn falls_back_to_default_url() {
        let config = Config::default();
        assert_eq!(config.api_url_from(None, None), DEFAULT_BASE_URL);
    }
}
