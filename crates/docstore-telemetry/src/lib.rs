//! Observability setup for Docstore.
//!
//! Docstore logs through `tracing` with structured fields. This crate
//! installs the process-wide subscriber (JSON for production, pretty for
//! local runs) and defines the request macros the server uses so log lines
//! carry the same field names.

#![doc(html_root_url = "https://docs.rs/docstore-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
