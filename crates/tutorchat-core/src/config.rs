//! Client configuration.
//!
//! Supports reading `~/.config/tutorchat/config.toml`; every field has a
//! default so the client runs with no file present. Environment variables
//! `TUTORCHAT_BASE_URL` and `TUTORCHAT_TIMEOUT_SECS` override the file.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::error::Result;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5001";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the tutoring service.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Base URL the endpoint paths are joined onto.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ClientConfig {
    /// Loads the configuration file if it exists, then applies environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns an error when the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let config = match config_path() {
            Some(path) if path.exists() => {
                let content = std::fs::read_to_string(&path)?;
                toml::from_str(&content)?
            }
            _ => Self::default(),
        };
        Ok(config.with_env_overrides())
    }

    /// Applies `TUTORCHAT_*` environment variables over the current values.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("TUTORCHAT_BASE_URL") {
            if !url.is_empty() {
                self.base_url = url;
            }
        }
        if let Some(secs) = std::env::var("TUTORCHAT_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.timeout_secs = secs;
        }
        self
    }

    /// The per-request timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Returns the path to the configuration file: ~/.config/tutorchat/config.toml
fn config_path() -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    Some(home.join(".config").join("tutorchat").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: ClientConfig = toml::from_str("base_url = \"http://example.com\"").unwrap();
        assert_eq!(config.base_url, "http://example.com");
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        assert!(toml::from_str::<ClientConfig>("timeout_secs = \"soon\"").is_err());
    }
}
