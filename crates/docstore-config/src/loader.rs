//! Configuration loader with layered approach.
//!
//! Later layers override earlier ones:
//! 1. Default values
//! 2. Configuration file (TOML or JSON)
//! 3. Environment variables, optionally seeded from a `.env` file

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;

use crate::{ConfigError, DocstoreConfig, LogFormat};

/// Prefix for structured environment overrides (`DOCSTORE__SECTION__KEY`).
pub const ENV_PREFIX: &str = "DOCSTORE";

/// Configuration loader with layered approach.
///
/// # Example
///
/// ```no_run
/// use docstore_config::ConfigLoader;
///
/// # fn main() -> Result<(), docstore_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_optional_file("docstore.toml")?
///     .with_dotenv(".env")?
///     .with_env()?
///     .load()?;
///
/// println!("listening on {}", config.http_addr()?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config: DocstoreConfig,
}

impl ConfigLoader {
    /// Create a loader holding default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a file.
    ///
    /// The format is picked from the extension (`.toml` or `.json`). The file
    /// replaces the current configuration; sections it omits take defaults.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        self.config = Self::parse_file(&content, path)?;
        tracing::debug!(path = %path.display(), "Loaded configuration file");

        Ok(self)
    }

    /// Load configuration from a file if it exists.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string in the given format (`toml` or `json`).
    ///
    /// # Example
    ///
    /// ```
    /// use docstore_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [server]
    ///     port = 3000
    ///
    ///     [storage]
    ///     database_url = "memory://"
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.server.port, Some(3000));
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => {
                return Err(ConfigError::validation_error(format!(
                    "unsupported configuration format: {format}"
                )))
            }
        };
        Ok(self)
    }

    /// Load a `.env` file into the process environment.
    ///
    /// A missing file is not an error. Variables already set in the
    /// environment win over the file.
    pub fn with_dotenv<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match dotenvy::from_path(path) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "Loaded env file");
                Ok(self)
            }
            Err(dotenvy::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(self),
            Err(e) => Err(ConfigError::dotenv_error(path, e)),
        }
    }

    /// Apply overrides from the process environment.
    ///
    /// See [`with_env_vars`](Self::with_env_vars) for the recognised names.
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_env_vars(env::vars())
    }

    /// Apply overrides from the given variables.
    ///
    /// Recognised names:
    /// - `PORT`, `DATABASE_URL`, `MONGO_STRING` (legacy alias for
    ///   `DATABASE_URL`, which wins when both are set), `LOG_LEVEL`
    /// - `DOCSTORE__SECTION__KEY` for any field, applied last
    ///
    /// Other variables are ignored.
    pub fn with_env_vars<I, K, V>(mut self, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: BTreeMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        for key in ["MONGO_STRING", "DATABASE_URL", "PORT", "LOG_LEVEL"] {
            if let Some(value) = vars.get(key) {
                self.apply_plain_var(key, value)?;
            }
        }

        let prefix = format!("{ENV_PREFIX}__");
        for (key, value) in &vars {
            if let Some(path) = key.strip_prefix(&prefix) {
                self.apply_prefixed_var(key, path, value)?;
            }
        }

        Ok(self)
    }

    /// Finalize and validate.
    pub fn load(self) -> Result<DocstoreConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }

    /// Finalize without validation.
    #[must_use]
    pub fn load_unvalidated(self) -> DocstoreConfig {
        self.config
    }

    fn parse_file(content: &str, path: &Path) -> Result<DocstoreConfig, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            _ => Err(ConfigError::validation_error(format!(
                "unsupported configuration file format: {}",
                path.display()
            ))),
        }
    }

    fn apply_plain_var(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "PORT" => self.config.server.port = Some(parse_port(key, value)?),
            "DATABASE_URL" | "MONGO_STRING" => {
                if !value.is_empty() {
                    self.config.storage.database_url = Some(value.to_string());
                }
            }
            "LOG_LEVEL" => self.config.logging.level = value.to_string(),
            _ => {}
        }
        Ok(())
    }

    fn apply_prefixed_var(&mut self, key: &str, path: &str, value: &str) -> Result<(), ConfigError> {
        let parts: Vec<&str> = path.split("__").collect();

        match parts.as_slice() {
            ["SERVER", "HOST"] => self.config.server.host = value.to_string(),
            ["SERVER", "PORT"] => self.config.server.port = Some(parse_port(key, value)?),
            ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
                self.config.server.shutdown_timeout_secs = parse_secs(key, value)?;
            }
            ["SERVER", "READ_TIMEOUT_SECS"] => {
                self.config.server.read_timeout_secs = parse_secs(key, value)?;
            }
            ["SERVER", "WRITE_TIMEOUT_SECS"] => {
                self.config.server.write_timeout_secs = parse_secs(key, value)?;
            }

            ["STORAGE", "DATABASE_URL"] => {
                self.config.storage.database_url = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }
            ["STORAGE", "DATABASE"] => self.config.storage.database = value.to_string(),
            ["STORAGE", "COLLECTION"] => self.config.storage.collection = value.to_string(),

            ["LOGGING", "ENABLED"] => {
                self.config.logging.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["LOGGING", "LEVEL"] => self.config.logging.level = value.to_string(),
            ["LOGGING", "FORMAT"] => {
                self.config.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json' or 'pretty'",
                        ))
                    }
                };
            }
            ["LOGGING", "ANSI_ENABLED"] => {
                self.config.logging.ansi_enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }

            _ => tracing::debug!(var = %key, "Ignoring unknown configuration variable"),
        }

        Ok(())
    }
}

fn parse_port(key: &str, value: &str) -> Result<u16, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::env_parse_error(key, "expected port number (0-65535)"))
}

fn parse_secs(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
