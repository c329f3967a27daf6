// Database Configuration

use artistdb_core::error::{AppError, Result};
use std::time::Duration;

pub const DEFAULT_URL: &str = "sqlite://artists.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_ROLLBACK_TIMEOUT: Duration = Duration::from_secs(2);

/// Connection settings for the SQLite store
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// `sqlite://path/to/file.db`, a plain path, or `sqlite::memory:`
    pub url: String,
    /// Pool size. In-memory databases always use a single connection.
    pub max_connections: u32,
    /// Upper bound for every database command
    pub command_timeout: Duration,
    /// Upper bound for rolling back a failed transaction
    pub rollback_timeout: Duration,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            rollback_timeout: DEFAULT_ROLLBACK_TIMEOUT,
        }
    }

    /// Private in-memory database (tests)
    pub fn in_memory() -> Self {
        Self::new("sqlite::memory:")
    }

    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }

    /// Pool size actually used
    pub fn pool_size(&self) -> u32 {
        if self.is_in_memory() {
            // Every connection to :memory: opens its own empty database
            1
        } else {
            self.max_connections
        }
    }

    /// Read `ARTISTDB_DB_URL`, `ARTISTDB_DB_MAX_CONNECTIONS` and
    /// `ARTISTDB_DB_COMMAND_TIMEOUT_MS`, falling back to [`DEFAULT_URL`].
    pub fn from_env() -> Result<Self> {
        Self::from_env_or(DEFAULT_URL)
    }

    /// Like [`DatabaseConfig::from_env`] with a caller supplied fallback URL.
    pub fn from_env_or(default_url: impl Into<String>) -> Result<Self> {
        Self::from_lookup(default_url, |key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source (env, tests)
    pub fn from_lookup(
        default_url: impl Into<String>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let url = lookup("ARTISTDB_DB_URL").unwrap_or_else(|| default_url.into());
        let mut config = Self::new(url);

        if let Some(value) = lookup("ARTISTDB_DB_MAX_CONNECTIONS") {
            config.max_connections = value.parse().map_err(|_| {
                AppError::Config(format!("ARTISTDB_DB_MAX_CONNECTIONS: invalid value {:?}", value))
            })?;
        }

        if let Some(value) = lookup("ARTISTDB_DB_COMMAND_TIMEOUT_MS") {
            let millis: u64 = value.parse().map_err(|_| {
                AppError::Config(format!(
                    "ARTISTDB_DB_COMMAND_TIMEOUT_MS: invalid value {:?}",
                    value
                ))
            })?;
            config.command_timeout = Duration::from_millis(millis);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(AppError::Config("database url must not be empty".to_string()));
        }

        if self.max_connections == 0 {
            return Err(AppError::Config(
                "max_connections must be at least 1".to_string(),
            ));
        }

        if self.command_timeout.is_zero() || self.rollback_timeout.is_zero() {
            return Err(AppError::Config("timeouts must be non-zero".to_string()));
        }

        Ok(())
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::new(DEFAULT_URL)
    }
}
