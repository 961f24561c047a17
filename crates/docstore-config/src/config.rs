//! Root configuration type.

use std::net::{IpAddr, SocketAddr};

use serde::{Deserialize, Serialize};

use crate::{ConfigError, LoggingSection, ServerSection, StorageSection};

/// Complete Docstore configuration.
///
/// Built once at startup by [`ConfigLoader`](crate::ConfigLoader) and passed
/// by reference to whatever needs it.
///
/// # Example
///
/// ```
/// use docstore_config::DocstoreConfig;
///
/// let mut config = DocstoreConfig::default();
/// assert!(config.validate().is_err());
///
/// config.server.port = Some(8080);
/// config.storage.database_url = Some("memory://".to_string());
/// assert!(config.validate().is_ok());
/// assert_eq!(config.http_addr().unwrap().to_string(), "0.0.0.0:8080");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct DocstoreConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerSection,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageSection,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSection,
}

impl DocstoreConfig {
    /// Checks that mandatory values are present and well formed.
    ///
    /// # Errors
    ///
    /// - `MissingField` if the port or database URL is unset
    /// - `InvalidValue` if the host is not an IP address or a timeout is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port.is_none() {
            return Err(ConfigError::missing_field("server.port"));
        }

        match self.storage.database_url.as_deref() {
            None => return Err(ConfigError::missing_field("storage.database_url")),
            Some(url) if url.trim().is_empty() => {
                return Err(ConfigError::missing_field("storage.database_url"))
            }
            Some(_) => {}
        }

        if self.server.host.parse::<IpAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "server.host",
                format!("not an IP address: {}", self.server.host),
            ));
        }

        for (field, secs) in [
            ("server.shutdown_timeout_secs", self.server.shutdown_timeout_secs),
            ("server.read_timeout_secs", self.server.read_timeout_secs),
            ("server.write_timeout_secs", self.server.write_timeout_secs),
        ] {
            if secs == 0 {
                return Err(ConfigError::invalid_value(field, "must be greater than 0"));
            }
        }

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::invalid_value("logging.level", "must not be empty"));
        }

        Ok(())
    }

    /// Returns the socket address to bind.
    pub fn http_addr(&self) -> Result<SocketAddr, ConfigError> {
        let port = self
            .server
            .port
            .ok_or_else(|| ConfigError::missing_field("server.port"))?;
        let ip: IpAddr = self.server.host.parse().map_err(|_| {
            ConfigError::invalid_value(
                "server.host",
                format!("not an IP address: {}", self.server.host),
            )
        })?;
        Ok(SocketAddr::new(ip, port))
    }

    /// Returns the database URL.
    pub fn database_url(&self) -> Result<&str, ConfigError> {
        self.storage
            .database_url
            .as_deref()
            .ok_or_else(|| ConfigError::missing_field("storage.database_url"))
    }
}
