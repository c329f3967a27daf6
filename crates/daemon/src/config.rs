//! Daemon configuration from environment variables

use anyhow::{anyhow, Context, Result};
use artistdb_api_rpc::RpcServerConfig;
use artistdb_infra_sqlite::DatabaseConfig;

const DEFAULT_DB_PATH: &str = "~/.artistdb/artists.db";
const DEFAULT_SAMPLE_RATE: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Production: one JSON object per line
    Json,
    /// Development: human readable, multi-line
    Pretty,
}

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub database: DatabaseConfig,
    pub rpc_host: String,
    pub rpc_port: u16,
    pub log_format: LogFormat,
    /// Fraction of traces exported when telemetry is enabled; 0 disables export
    pub tracing_sample_rate: f64,
}

impl DaemonConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let default_db = shellexpand::tilde(DEFAULT_DB_PATH).into_owned();
        let database = DatabaseConfig::from_lookup(default_db, &lookup)
            .map_err(|e| anyhow!("{}", e))?;

        let rpc_defaults = RpcServerConfig::default();
        let rpc_host = lookup("ARTISTDB_RPC_HOST").unwrap_or(rpc_defaults.host);
        let rpc_port = match lookup("ARTISTDB_RPC_PORT") {
            Some(value) => value
                .parse()
                .with_context(|| format!("ARTISTDB_RPC_PORT: invalid value {:?}", value))?,
            None => rpc_defaults.port,
        };

        let log_format = match lookup("ARTISTDB_LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        let tracing_sample_rate = match lookup("ARTISTDB_TRACING_SAMPLE_RATE") {
            Some(value) => value.parse().with_context(|| {
                format!("ARTISTDB_TRACING_SAMPLE_RATE: invalid value {:?}", value)
            })?,
            None => DEFAULT_SAMPLE_RATE,
        };

        let config = Self {
            database,
            rpc_host,
            rpc_port,
            log_format,
            tracing_sample_rate,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.rpc_host.trim().is_empty() {
            return Err(anyhow!("ARTISTDB_RPC_HOST must not be empty"));
        }

        if !(0.0..=1.0).contains(&self.tracing_sample_rate) {
            return Err(anyhow!(
                "ARTISTDB_TRACING_SAMPLE_RATE must be within [0, 1], got {}",
                self.tracing_sample_rate
            ));
        }

        self.database.validate().map_err(|e| anyhow!("{}", e))
    }

    pub fn rpc(&self) -> RpcServerConfig {
        RpcServerConfig {
            host: self.rpc_host.clone(),
            port: self.rpc_port,
        }
    }
}
