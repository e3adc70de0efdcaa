//! Configuration loading and typed config structures for the daemon.
//!
//! The canonical configuration lives in `chainwatch.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure, and provides a loader that reads the file, applies
//! environment overrides, and validates the result.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A configured value is outside its valid range.
    #[error("invalid config value: {message}")]
    Invalid {
        /// Description of the rejected value.
        message: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level daemon configuration.
///
/// Mirrors the structure of `chainwatch.yaml`. All fields have defaults
/// so a missing file or empty document yields a working configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DaemonConfig {
    /// Ledger JSON-RPC endpoint settings.
    #[serde(default)]
    pub rpc: RpcConfig,

    /// Background refresh settings.
    #[serde(default)]
    pub watcher: WatcherConfig,

    /// HTTP API server settings.
    #[serde(default)]
    pub server: ServerConfig,
}

impl DaemonConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `CHAINWATCH_RPC_URL` overrides `rpc.endpoint`
    /// - `CHAINWATCH_BIND_ADDR` overrides `server.host` and `server.port`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is outside its valid range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is outside its valid range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Override config values with environment variables when set.
    ///
    /// This allows a deployment to point the daemon at a different
    /// ledger endpoint or bind address without editing the YAML file.
    pub fn apply_env_overrides(&mut self) {
        self.rpc.apply_env_overrides();
        self.server.apply_env_overrides();
    }

    /// Reject values that would break the watcher at runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the request timeout or the
    /// refresh interval is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rpc.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                message: "rpc.request_timeout_ms must be greater than zero".to_owned(),
            });
        }
        if self.watcher.refresh_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                message: "watcher.refresh_interval_secs must be greater than zero".to_owned(),
            });
        }
        Ok(())
    }
}

/// Ledger JSON-RPC endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RpcConfig {
    /// The JSON-RPC endpoint URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Timeout per JSON-RPC request in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl RpcConfig {
    /// The per-request timeout as a [`Duration`].
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Override the endpoint with `CHAINWATCH_RPC_URL` when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("CHAINWATCH_RPC_URL") {
            self.endpoint = val;
        }
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// Background refresh configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WatcherConfig {
    /// Seconds between background refresh cycles.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
}

impl WatcherConfig {
    /// The refresh interval as a [`Duration`].
    pub const fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval_secs(),
        }
    }
}

/// HTTP API server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// The host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// The TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    /// Override host and port with `CHAINWATCH_BIND_ADDR` when set.
    ///
    /// The value must be `host:port`. Malformed values are logged and
    /// ignored so a typo cannot take the YAML-configured address down
    /// with it.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("CHAINWATCH_BIND_ADDR") {
            if let Some((host, port)) = val.rsplit_once(':')
                && let Ok(port) = port.parse::<u16>()
            {
                self.host = host.to_owned();
                self.port = port;
            } else {
                warn!(value = val, "ignoring malformed CHAINWATCH_BIND_ADDR");
            }
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

fn default_endpoint() -> String {
    chainwatch_rpc::DEFAULT_ENDPOINT.to_owned()
}

const fn default_request_timeout_ms() -> u64 {
    5000
}

const fn default_refresh_interval_secs() -> u64 {
    30
}

fn default_host() -> String {
    "127.0.0.1".to_owned()
}

const fn default_port() -> u16 {
    8080
}
