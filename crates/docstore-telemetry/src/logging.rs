//! Structured logging.
//!
//! # Example
//!
//! ```rust,ignore
//! use docstore_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::from(&config.logging))?;
//!
//! tracing::info!(operation_id = "createDocument", "Processing request");
//! ```

use docstore_config::{LogFormat, LoggingSection};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Whether logging is enabled.
    pub enabled: bool,

    /// `EnvFilter` directive (e.g. `info`, `docstore_server=debug,sqlx=warn`).
    pub level: String,

    /// Whether to output JSON format.
    pub json_format: bool,

    /// Whether to emit ANSI colour codes (pretty format only).
    pub ansi: bool,

    /// Whether to include file/line info.
    pub file_line_info: bool,

    /// Whether to include target (module path).
    pub include_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            json_format: true,
            ansi: false,
            file_line_info: false,
            include_target: true,
        }
    }
}

impl From<&LoggingSection> for LogConfig {
    fn from(section: &LoggingSection) -> Self {
        Self {
            enabled: section.enabled,
            level: section.level.clone(),
            json_format: section.format == LogFormat::Json,
            ansi: section.ansi_enabled,
            ..Self::default()
        }
    }
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns `InvalidConfig` for an unparseable level and `LoggingInit` if a
/// global subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.level)?;

    if config.json_format {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_target(config.include_target)
            .with_filter(filter);

        tracing_subscriber::registry()
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .pretty()
            .with_ansi(config.ansi)
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_target(config.include_target)
            .with_filter(filter);

        tracing_subscriber::registry()
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    }

    Ok(())
}

/// Creates an env filter from a directive string.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter)
        .map_err(|e| TelemetryError::InvalidConfig(format!("invalid log level '{filter}': {e}")))
}

/// Logs a request completion event.
#[macro_export]
macro_rules! log_request_complete {
    ($method:expr, $path:expr, $operation:expr, $status:expr, $duration_ms:expr) => {
        tracing::info!(
            http.method = %$method,
            http.path = %$path,
            operation_id = %$operation,
            http.status_code = $status,
            duration_ms = $duration_ms,
            "Request completed"
        );
    };
}

/// Logs a request error event.
#[macro_export]
macro_rules! log_request_error {
    ($operation:expr, $status:expr, $error:expr) => {
        tracing::warn!(
            operation_id = %$operation,
            http.status_code = $status,
            error = %$error,
            "Request failed"
        );
    };
}
