//! artistdb - Main Entry Point
//! JSON-RPC server over the SQLite artist/location/event store

mod config;
mod telemetry;

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Import workspace crates
use artistdb_api_rpc::{RpcHandler, RpcServer};
use artistdb_core::port::{HealthCheck, InMemoryMetrics, SystemTimeProvider};
use artistdb_infra_sqlite::{Database, Observability};
use config::{DaemonConfig, LogFormat};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration
    let config = DaemonConfig::from_env().context("Invalid configuration")?;

    // 2. Initialize logging (stdout through a non-blocking writer)
    let (writer, _log_guard) = tracing_appender::non_blocking(std::io::stdout());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("artistdb=info"))
        .context("Failed to create env filter")?;

    let otel_layer = telemetry::layer(config.tracing_sample_rate)
        .context("Failed to initialize OpenTelemetry")?;
    let otel_active = otel_layer.is_some();

    match config.log_format {
        LogFormat::Json => {
            // Production: JSON structured logging
            tracing_subscriber::registry()
                .with(otel_layer)
                .with(env_filter)
                .with(fmt::layer().json().with_writer(writer))
                .init();
        }
        LogFormat::Pretty => {
            // Development: Pretty formatting with colors
            tracing_subscriber::registry()
                .with(otel_layer)
                .with(env_filter)
                .with(fmt::layer().pretty().with_writer(writer))
                .init();
        }
    }

    info!("artistdb v{} starting...", VERSION);

    if otel_active {
        info!("OpenTelemetry export enabled");
    } else if telemetry::requested() && !telemetry::ENABLED {
        tracing::warn!("OpenTelemetry endpoint set but feature 'telemetry' not enabled");
        tracing::warn!("Rebuild with: cargo build --features telemetry");
    }

    // 3. Initialize database
    if !config.database.is_in_memory() {
        ensure_parent_dir(&config.database.url)?;
    }

    info!(db_url = %config.database.url, "Initializing database...");

    let metrics = Arc::new(InMemoryMetrics::new());
    let db = Arc::new(
        Database::connect(
            &config.database,
            Observability {
                metrics: metrics.clone(),
                clock: Arc::new(SystemTimeProvider),
            },
        )
        .await
        .context("DB connection failed")?,
    );

    db.ready().await.context("Database not ready")?;
    db.create_tables().await.context("Migration failed")?;

    // 4. Start JSON-RPC server
    info!("Starting JSON-RPC server...");
    let handler = RpcHandler::new(db.clone(), db.clone(), db.clone(), db.clone(), metrics);
    let (rpc_handle, addr) = RpcServer::new(config.rpc(), handler)
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("RPC server start failed: {}", e))?;

    info!(addr = %addr, "System ready");
    info!("Press Ctrl+C to shutdown");

    // 5. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");

    // 6. Graceful shutdown
    rpc_handle
        .stop()
        .map_err(|e| anyhow::anyhow!("RPC server stop failed: {}", e))?;
    rpc_handle.stopped().await;
    db.close().await;
    telemetry::shutdown();

    info!("Shutdown complete.");

    Ok(())
}

/// SQLite creates the file but not its directory
fn ensure_parent_dir(url: &str) -> Result<()> {
    let path = url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:");
    let path = path.split('?').next().unwrap_or(path);

    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    Ok(())
}
