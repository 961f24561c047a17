//! Backend selection from a connection URL.

use std::fmt;
use std::sync::Arc;

use docstore_core::{StorageAdapter, StoreError, StoreResult};

use crate::memory::InMemoryAdapter;

/// Backend kinds a URL can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// `mongodb://` or `mongodb+srv://`.
    Mongo,
    /// `sqlite:` URLs.
    Sqlite,
    /// `memory://`.
    Memory,
}

impl Backend {
    /// Picks a backend from the URL scheme.
    ///
    /// # Example
    ///
    /// ```
    /// use docstore_storage::Backend;
    ///
    /// assert_eq!(Backend::from_url("mongodb://localhost:27017").unwrap(), Backend::Mongo);
    /// assert_eq!(Backend::from_url("sqlite::memory:").unwrap(), Backend::Sqlite);
    /// assert_eq!(Backend::from_url("memory://").unwrap(), Backend::Memory);
    /// assert!(Backend::from_url("redis://localhost").is_err());
    /// ```
    pub fn from_url(url: &str) -> StoreResult<Self> {
        let url = url.trim();
        if url.is_empty() {
            return Err(StoreError::invalid_argument("database url must not be empty"));
        }

        if url.starts_with("mongodb://") || url.starts_with("mongodb+srv://") {
            Ok(Self::Mongo)
        } else if url.starts_with("sqlite:") {
            Ok(Self::Sqlite)
        } else if url.starts_with("memory:") {
            Ok(Self::Memory)
        } else {
            Err(StoreError::invalid_argument(format!(
                "unsupported database url scheme: {}",
                redact(url)
            )))
        }
    }

    /// Short name, matching [`StorageAdapter::backend_name`].
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mongo => "mongodb",
            Self::Sqlite => "sqlite",
            Self::Memory => "memory",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options that only some backends use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    /// Database name (document store).
    pub database: String,
    /// Collection name (document store).
    pub collection: String,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            database: "test".to_string(),
            collection: "base".to_string(),
        }
    }
}

/// Connects to the backend selected by `url`.
pub async fn connect(url: &str, options: &ConnectOptions) -> StoreResult<Arc<dyn StorageAdapter>> {
    let backend = Backend::from_url(url)?;
    tracing::debug!(backend = %backend, url = %redact(url), "Connecting storage backend");

    match backend {
        Backend::Memory => Ok(Arc::new(InMemoryAdapter::new())),
        Backend::Sqlite => connect_sqlite(url).await,
        Backend::Mongo => connect_mongo(url, options).await,
    }
}

#[cfg(feature = "sqlite")]
async fn connect_sqlite(url: &str) -> StoreResult<Arc<dyn StorageAdapter>> {
    Ok(Arc::new(crate::sql::SqlAdapter::connect(url).await?))
}

#[cfg(not(feature = "sqlite"))]
async fn connect_sqlite(_url: &str) -> StoreResult<Arc<dyn StorageAdapter>> {
    Err(StoreError::backend("sqlite support not compiled in"))
}

#[cfg(feature = "mongo")]
async fn connect_mongo(url: &str, options: &ConnectOptions) -> StoreResult<Arc<dyn StorageAdapter>> {
    Ok(Arc::new(
        crate::mongo::MongoAdapter::connect(url, &options.database, &options.collection).await?,
    ))
}

#[cfg(not(feature = "mongo"))]
async fn connect_mongo(_url: &str, _options: &ConnectOptions) -> StoreResult<Arc<dyn StorageAdapter>> {
    Err(StoreError::backend("mongodb support not compiled in"))
}

/// Strips credentials (`user:pass@`) from a URL for logging.
#[must_use]
pub fn redact(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let authority_end = rest.find('/').unwrap_or(rest.len());
    match rest[..authority_end].rfind('@') {
        Some(at) => format!("{scheme}://***@{}", &rest[at + 1..]),
        None => url.to_string(),
    }
}
