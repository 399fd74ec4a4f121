//! Configuration for the chatline client.
//!
//! Settings live in a JSON file (by default `<config dir>/chatline/config.json`).
//! Every field has a default, so a missing file or a partial file is valid.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Message appended when a turn fails for any reason.
pub const DEFAULT_ERROR_MESSAGE: &str = "Sorry, an error occurred. Please try again.";

/// Greeting appended when the opening exchange fails.
pub const DEFAULT_FALLBACK_GREETING: &str = "Hello! How can I assist you today?";

/// Sentinel message sent by the opening exchange.
pub const DEFAULT_BOOTSTRAP_MESSAGE: &str = "start";

/// Main configuration for chatline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// URL of the chat endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Message sent by the opening exchange, with an empty history.
    #[serde(default = "default_bootstrap_message")]
    pub bootstrap_message: String,

    /// Text shown in place of a reply when a turn fails.
    #[serde(default = "default_error_message")]
    pub error_message: String,

    /// Greeting shown when the opening exchange fails.
    #[serde(default = "default_fallback_greeting")]
    pub fallback_greeting: String,

    /// `strftime` format of the per-message time label; `null` hides labels.
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: Option<String>,
}

fn default_endpoint() -> String {
    "http://127.0.0.1:5000/chat".into()
}

fn default_bootstrap_message() -> String {
    DEFAULT_BOOTSTRAP_MESSAGE.into()
}

fn default_error_message() -> String {
    DEFAULT_ERROR_MESSAGE.into()
}

fn default_fallback_greeting() -> String {
    DEFAULT_FALLBACK_GREETING.into()
}

#[allow(clippy::unnecessary_wraps)]
fn default_timestamp_format() -> Option<String> {
    Some("%H:%M".into())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            bootstrap_message: default_bootstrap_message(),
            error_message: default_error_message(),
            fallback_greeting: default_fallback_greeting(),
            timestamp_format: default_timestamp_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Parse)
    }

    /// Load configuration, falling back to defaults if the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::Io)?;
        }
        std::fs::write(path, content).map_err(ConfigError::Io)
    }

    /// Default location of the config file.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        Ok(config_dir()?.join("config.json"))
    }

    /// Parse and validate the endpoint URL.
    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.endpoint)
            .map_err(|e| ConfigError::InvalidEndpoint(self.endpoint.clone(), e.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::InvalidEndpoint(
                self.endpoint.clone(),
                format!("unsupported scheme `{other}`"),
            )),
        }
    }
}

/// Directory holding chatline's config and log files.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join("chatline"))
        .ok_or(ConfigError::NoConfigDir)
}

/// Errors that can occur when loading or saving configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parse error.
    #[error("Parse error: {0}")]
    Parse(#[source] serde_json::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Endpoint is not an http(s) URL.
    #[error("Invalid endpoint `{0}`: {1}")]
    InvalidEndpoint(String, String),

    /// Platform has no config directory.
    #[error("Could not determine config directory")]
    NoConfigDir,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.endpoint, "http://127.0.0.1:5000/chat");
        assert_eq!(config.bootstrap_message, "start");
        assert_eq!(config.error_message, DEFAULT_ERROR_MESSAGE);
        assert_eq!(config.fallback_greeting, DEFAULT_FALLBACK_GREETING);
        assert_eq!(config.timestamp_format.as_deref(), Some("%H:%M"));
    }

    #[test]
    fn test_config_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.json");

        let config = Config {
            endpoint: "https://chat.example.com/chat".into(),
            timestamp_format: None,
            ..Default::default()
        };
        config.save(&config_path).unwrap();

        let loaded = Config::load(&config_path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let partial = r#"{ "endpoint": "http://localhost:8080/chat" }"#;
        std::fs::write(&config_path, partial).unwrap();

        let config = Config::load(&config_path).unwrap();
        assert_eq!(config.endpoint, "http://localhost:8080/chat");
        assert_eq!(config.error_message, DEFAULT_ERROR_MESSAGE);
        assert_eq!(config.timestamp_format.as_deref(), Some("%H:%M"));
    }

    #[test]
    fn test_null_timestamp_format_disables_labels() {
        let config: Config = serde_json::from_str(r#"{ "timestamp_format": null }"#).unwrap();
        assert_eq!(config.timestamp_format, None);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::load_or_default(&temp_dir.path().join("absent.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        std::fs::write(&config_path, "{ not json").unwrap();

        assert!(matches!(
            Config::load(&config_path),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_endpoint_url_validation() {
        let config = Config::default();
        assert_eq!(config.endpoint_url().unwrap().path(), "/chat");

        let config = Config {
            endpoint: "not a url".into(),
            ..Default::default()
        };
        assert!(matches!(
            config.endpoint_url(),
            Err(ConfigError::InvalidEndpoint(..))
        ));

        let config = Config {
            endpoint: "ftp://example.com/chat".into(),
            ..Default::default()
        };
        assert!(matches!(
            config.endpoint_url(),
            Err(ConfigError::InvalidEndpoint(..))
        ));
    }
}
