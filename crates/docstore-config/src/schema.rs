//! Configuration schema types.
//!
//! This module defines the structure of all configuration sections.

use serde::{Deserialize, Serialize};

/// HTTP listener section.
///
/// # Example
///
/// ```
/// use docstore_config::ServerSection;
///
/// let server = ServerSection {
///     port: Some(8080),
///     ..Default::default()
/// };
/// assert_eq!(server.host, "0.0.0.0");
/// assert_eq!(server.shutdown_timeout_secs, 10);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    /// IP address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind. Required; `0` picks an ephemeral port.
    #[serde(default)]
    pub port: Option<u16>,

    /// Grace period for in-flight requests once shutdown starts.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Upper bound on reading a request body.
    #[serde(default = "default_io_timeout")]
    pub read_timeout_secs: u64,

    /// Upper bound on producing a response.
    #[serde(default = "default_io_timeout")]
    pub write_timeout_secs: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: None,
            shutdown_timeout_secs: default_shutdown_timeout(),
            read_timeout_secs: default_io_timeout(),
            write_timeout_secs: default_io_timeout(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_shutdown_timeout() -> u64 {
    10
}

fn default_io_timeout() -> u64 {
    30
}

/// Storage backend section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StorageSection {
    /// Backend connection URL. Required; the scheme picks the backend.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Database name (document store only).
    #[serde(default = "default_database")]
    pub database: String,

    /// Collection name (document store only).
    #[serde(default = "default_collection")]
    pub collection: String,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            database_url: None,
            database: default_database(),
            collection: default_collection(),
        }
    }
}

fn default_database() -> String {
    "test".to_string()
}

fn default_collection() -> String {
    "base".to_string()
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level or `EnvFilter` directive (e.g. `info`, `docstore=debug`).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include ANSI color codes in output.
    #[serde(default)]
    pub ansi_enabled: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            ansi_enabled: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}
