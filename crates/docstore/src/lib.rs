//! # Docstore
//!
//! A small HTTP document store. Documents are opaque strings with a
//! backend-assigned id and a creation timestamp; they can be created,
//! fetched, deleted and listed by creation time.
//!
//! The backend is chosen from the database URL at startup:
//!
//! | URL | Backend |
//! |-----|---------|
//! | `mongodb://`, `mongodb+srv://` | MongoDB |
//! | `sqlite:` | SQLite |
//! | `memory://` | in-process map |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use docstore::config::ConfigLoader;
//! use docstore::server::ShutdownCoordinator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::new().with_env()?.load()?;
//!     let server = docstore::build_server(&config).await?;
//!
//!     let coordinator = ShutdownCoordinator::new(server.config().shutdown_timeout());
//!     server.run(coordinator).await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/docstore/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use std::time::Duration;

use anyhow::Context;

// Re-export core types
pub use docstore_core as core;

// Re-export storage adapters
pub use docstore_storage as storage;

// Re-export server types
pub use docstore_server as server;

// Re-export configuration
pub use docstore_config as config;

// Re-export telemetry
pub use docstore_telemetry as telemetry;

use docstore_config::DocstoreConfig;
use docstore_core::DocumentService;
use docstore_server::{Server, ServerConfig};
use docstore_storage::ConnectOptions;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Derives the server settings from a validated configuration.
pub fn server_config(config: &DocstoreConfig) -> anyhow::Result<ServerConfig> {
    let addr = config.http_addr().context("invalid listen address")?;
    Ok(ServerConfig::builder()
        .http_addr(addr.to_string())
        .shutdown_timeout(Duration::from_secs(config.server.shutdown_timeout_secs))
        .read_timeout(Duration::from_secs(config.server.read_timeout_secs))
        .write_timeout(Duration::from_secs(config.server.write_timeout_secs))
        .build())
}

/// Derives the backend options from a configuration.
pub fn connect_options(config: &DocstoreConfig) -> ConnectOptions {
    ConnectOptions {
        database: config.storage.database.clone(),
        collection: config.storage.collection.clone(),
    }
}

/// Connects storage and assembles a server ready to run.
pub async fn build_server(config: &DocstoreConfig) -> anyhow::Result<Server> {
    let server_config = server_config(config)?;
    let url = config.database_url().context("no database configured")?;

    let adapter = docstore_storage::connect(url, &connect_options(config))
        .await
        .with_context(|| {
            format!(
                "could not connect to database {}",
                docstore_storage::redact(url)
            )
        })?;

    tracing::info!(
        backend = adapter.backend_name(),
        url = %docstore_storage::redact(url),
        "Storage connected"
    );

    Ok(Server::new(server_config, DocumentService::new(adapter)))
}
