#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! ledgerwire Configuration
//!
//! This crate provides configuration management for ledgerwire clients.
//! It handles loading, saving, and managing configuration files that specify:
//! - Connection settings (transport kind, endpoint, credentials, timeout)
//! - Client behaviour (correlation id strategy)
//! - Logging configuration
//!
//! Configuration is stored in TOML format and can be loaded from files,
//! created with defaults for a local node, and overridden from the
//! environment.

use std::path::{Path, PathBuf};

use envelope::IdStrategy;
use logging::LoggingSettings;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading or saving configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    /// Failed to parse the TOML configuration file
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    /// Failed to serialize configuration to TOML format
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    /// An environment override holds a value that cannot be used
    #[error("Invalid value {value:?} for {key}")]
    InvalidEnv {
        /// Variable name
        key: &'static str,
        /// Rejected value
        value: String,
    },
    /// Could not locate the user's configuration directory
    #[error("Could not find user config directory")]
    ConfigDirUnavailable,
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// How to reach the node
    pub connection: ConnectionConfig,
    /// Client behaviour
    #[serde(default)]
    pub client: ClientConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which transport carries requests to the node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// One HTTP POST per request
    Http,
    /// One persistent WebSocket connection
    WebSocket,
}

impl std::str::FromStr for TransportKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" | "https" => Ok(TransportKind::Http),
            "websocket" | "ws" | "wss" => Ok(TransportKind::WebSocket),
            _ => Err(()),
        }
    }
}

/// Connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Transport kind
    pub transport: TransportKind,
    /// Endpoint URL (`http://…` or `ws://…`)
    pub endpoint: String,
    /// Per-invocation timeout in milliseconds, enforced by the client
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// HTTP basic authentication (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthConfig>,
}

/// Basic authentication credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Username
    pub username: String,
    /// Password
    pub password: String,
}

/// Correlation id strategy as written in configuration; `none` sends no id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdSetting {
    /// Milliseconds since the epoch
    Timestamp,
    /// Random UUID
    Uuid,
    /// Random 21-character id
    NanoId,
    /// Do not attach ids
    None,
}

impl IdSetting {
    /// Strategy to use, or `None` when ids are disabled
    pub fn strategy(self) -> Option<IdStrategy> {
        match self {
            IdSetting::Timestamp => Some(IdStrategy::Timestamp),
            IdSetting::Uuid => Some(IdStrategy::Uuid),
            IdSetting::NanoId => Some(IdStrategy::NanoId),
            IdSetting::None => None,
        }
    }
}

impl std::str::FromStr for IdSetting {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "timestamp" => Ok(IdSetting::Timestamp),
            "uuid" => Ok(IdSetting::Uuid),
            "nanoid" => Ok(IdSetting::NanoId),
            "none" => Ok(IdSetting::None),
            _ => Err(()),
        }
    }
}

/// Client behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// How correlation ids are minted
    pub id_strategy: IdSetting,
}

impl Default for ClientConfig {
    fn default() -> Self { Self { id_strategy: IdSetting::NanoId } }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive (debug, info, warn, error)
    pub level: String,
    /// Emit JSON lines
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self { Self { level: "info".to_string(), json: false } }
}

impl LoggingConfig {
    /// Settings for [`logging::init`]
    pub fn settings(&self) -> LoggingSettings {
        LoggingSettings { level: self.level.clone(), json: self.json }
    }
}

impl Config {
    /// Load configuration from a TOML file at `path`
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save this configuration as a pretty-printed TOML file at `path`
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Returns the default config file path:
    /// `{config_dir()}/ledgerwire/config.toml`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let config_dir =
            dirs::config_dir().ok_or(ConfigError::ConfigDirUnavailable)?.join("ledgerwire");
        Ok(config_dir.join("config.toml"))
    }

    /// Applies `LEDGERWIRE_*` environment overrides
    ///
    /// - `LEDGERWIRE_ENDPOINT`
    /// - `LEDGERWIRE_TRANSPORT` (`http` | `websocket`)
    /// - `LEDGERWIRE_TIMEOUT_MS`
    /// - `LEDGERWIRE_ID_STRATEGY` (`timestamp` | `uuid` | `nanoid` | `none`)
    /// - `LEDGERWIRE_LOG`
    pub fn apply_env(mut self) -> Result<Self, ConfigError> {
        fn parse_env<T: std::str::FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
            match std::env::var(key) {
                Ok(value) => value
                    .parse()
                    .map(Some)
                    .map_err(|_| ConfigError::InvalidEnv { key, value: value.clone() }),
                Err(_) => Ok(None),
            }
        }

        if let Ok(endpoint) = std::env::var("LEDGERWIRE_ENDPOINT") {
            self.connection.endpoint = endpoint;
        }
        if let Some(kind) = parse_env("LEDGERWIRE_TRANSPORT")? {
            self.connection.transport = kind;
        }
        if let Some(ms) = parse_env("LEDGERWIRE_TIMEOUT_MS")? {
            self.connection.timeout_ms = Some(ms);
        }
        if let Some(ids) = parse_env("LEDGERWIRE_ID_STRATEGY")? {
            self.client.id_strategy = ids;
        }
        if let Ok(level) = std::env::var("LEDGERWIRE_LOG") {
            self.logging.level = level;
        }
        Ok(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig {
                transport: TransportKind::WebSocket,
                endpoint: "ws://127.0.0.1:1337".to_string(),
                timeout_ms: None,
                auth: None,
            },
            client: ClientConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
