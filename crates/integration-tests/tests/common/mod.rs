//! Shared fixtures for the integration suites

#![allow(dead_code)]

use std::sync::Arc;

use artistdb_core::port::InMemoryMetrics;
use artistdb_core::port::SystemTimeProvider;
use artistdb_infra_sqlite::{Database, DatabaseConfig, Observability};

/// Fresh in-memory database with the schema applied
pub async fn setup() -> Database {
    setup_with_metrics(Arc::new(InMemoryMetrics::new())).await
}

pub async fn setup_with_metrics(metrics: Arc<InMemoryMetrics>) -> Database {
    let db = Database::connect(
        &DatabaseConfig::in_memory(),
        Observability {
            metrics,
            clock: Arc::new(SystemTimeProvider),
        },
    )
    .await
    .unwrap();
    db.create_tables().await.unwrap();
    db
}

/// Unique file path under the system temp dir
pub fn temp_db_url(label: &str) -> (String, std::path::PathBuf) {
    let path = std::env::temp_dir().join(format!("artistdb_{}_{}.db", label, uuid::Uuid::new_v4()));
    (format!("sqlite://{}", path.display()), path)
}

pub fn cleanup(path: &std::path::Path) {
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
    }
}
