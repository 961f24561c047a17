//! Typed configuration for Docstore.
//!
//! A single [`DocstoreConfig`] value is built at startup from, in order:
//! built-in defaults, an optional TOML/JSON file, an optional `.env` file and
//! the process environment. Unknown fields in files are rejected.
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//! shutdown_timeout_secs = 10
//! read_timeout_secs = 30
//! write_timeout_secs = 30
//!
//! [storage]
//! database_url = "mongodb://localhost:27017"
//! database = "test"
//! collection = "base"
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Field |
//! |----------|-------|
//! | `PORT` | `server.port` |
//! | `DATABASE_URL` / `MONGO_STRING` | `storage.database_url` |
//! | `LOG_LEVEL` | `logging.level` |
//! | `DOCSTORE__SECTION__KEY` | any field, e.g. `DOCSTORE__SERVER__HOST` |

#![doc(html_root_url = "https://docs.rs/docstore-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::DocstoreConfig;
pub use error::ConfigError;
pub use loader::{ConfigLoader, ENV_PREFIX};
pub use schema::{LogFormat, LoggingSection, ServerSection, StorageSection};
