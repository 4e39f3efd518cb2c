//! Console configuration.
//!
//! Settings come from a TOML file: the path given with `--config`, or
//! `config.toml` in the platform config directory when it exists. Every field
//! is optional and command-line flags override the file.
//!
//! ```toml
//! endpoint = "localhost:80"
//! panes = 6
//! handshake_timeout_ms = 10000
//! log_filter = "warn"
//! delivery = "queued"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use bithose_console_net::{SessionConfig, parse_endpoint};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default broker endpoint.
pub const DEFAULT_ENDPOINT: &str = "localhost:80";
/// Default number of panes.
pub const DEFAULT_PANES: usize = 6;

/// How session events reach pane logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Deliver through the console's event queue (one logical thread).
    #[default]
    Queued,
    /// Deliver on the transport's thread as events happen.
    Direct,
}

/// Console settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsoleConfig {
    /// Broker endpoint, `host:port` or a `ws://` URL.
    pub endpoint: String,
    /// Number of independent panes.
    pub panes: usize,
    /// Handshake timeout in milliseconds.
    pub handshake_timeout_ms: u64,
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Event delivery mode.
    pub delivery: DeliveryMode,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            panes: DEFAULT_PANES,
            handshake_timeout_ms: 10_000,
            log_filter: "warn".to_string(),
            delivery: DeliveryMode::Queued,
        }
    }
}

impl ConsoleConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Load `explicit` if given, else the default config file if it exists,
    /// else the built-in defaults.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    /// `config.toml` in the platform config directory.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("dev", "Bithose", "bithose-console")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Check every field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.panes == 0 {
            return Err(ConfigError::Invalid {
                field: "panes",
                message: "at least one pane is required".to_string(),
            });
        }
        if self.handshake_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "handshake_timeout_ms",
                message: "must be greater than zero".to_string(),
            });
        }
        self.endpoint_url()?;
        Ok(())
    }

    /// The endpoint as a `ws://` URL.
    pub fn endpoint_url(&self) -> Result<String, ConfigError> {
        parse_endpoint(&self.endpoint).map_err(|e| ConfigError::Invalid {
            field: "endpoint",
            message: e.to_string(),
        })
    }

    /// The handshake timeout.
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }

    /// Session settings shared by every pane.
    pub fn session_config(&self) -> Result<SessionConfig, ConfigError> {
        Ok(SessionConfig::new(self.endpoint_url()?).handshake_timeout(self.handshake_timeout()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ConsoleConfig::default();
        assert_eq!(config.panes, 6);
        assert_eq!(config.endpoint_url().unwrap(), "ws://localhost/");
        assert_eq!(config.delivery, DeliveryMode::Queued);
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = ConsoleConfig::from_toml_str("panes = 2\nendpoint = \"127.0.0.1:9000\"\n").unwrap();
        assert_eq!(config.panes, 2);
        assert_eq!(config.endpoint_url().unwrap(), "ws://127.0.0.1:9000/");
        assert_eq!(config.handshake_timeout(), Duration::from_secs(10));
        assert_eq!(config.log_filter, "warn");
    }

    #[test]
    fn test_delivery_mode() {
        let config = ConsoleConfig::from_toml_str("delivery = \"direct\"").unwrap();
        assert_eq!(config.delivery, DeliveryMode::Direct);
        assert!(matches!(
            ConsoleConfig::from_toml_str("delivery = \"sometimes\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_rejects_zero_panes() {
        let err = ConsoleConfig::from_toml_str("panes = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "panes", .. }));
    }

    #[test]
    fn test_rejects_secure_endpoint() {
        let err = ConsoleConfig::from_toml_str("endpoint = \"wss://localhost:443/\"").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "endpoint", .. }));
    }

    #[test]
    fn test_rejects_unknown_fields() {
        assert!(matches!(
            ConsoleConfig::from_toml_str("reconnect = true"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "panes = 3").unwrap();
        writeln!(file, "handshake_timeout_ms = 250").unwrap();

        let config = ConsoleConfig::load(file.path()).unwrap();
        assert_eq!(config.panes, 3);
        assert_eq!(config.handshake_timeout(), Duration::from_millis(250));

        let explicit = ConsoleConfig::load_or_default(Some(file.path())).unwrap();
        assert_eq!(explicit, config);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConsoleConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_session_config() {
        let config = ConsoleConfig {
            endpoint: "ws://broker:8080/".to_string(),
            handshake_timeout_ms: 500,
            ..ConsoleConfig::default()
        };
        let session = config.session_config().unwrap();
        assert_eq!(session.url, "ws://broker:8080/");
        assert_eq!(session.handshake_timeout, Duration::from_millis(500));
    }
}
