// artistdb Infrastructure - SQLite Adapter
// Implements: ArtistRepository, LocationRepository, EventRepository, HealthCheck

mod artist_repository;
mod batch;
mod config;
mod connection;
mod database;
mod error;
mod event_repository;
mod lifecycle;
mod location_repository;
mod migration;
mod transaction;

pub use artist_repository::SqliteArtistRepository;
pub use config::{DatabaseConfig, DEFAULT_URL};
pub use connection::{command, create_pool, Connection};
pub use database::{Database, Observability};
pub use error::DbError;
pub use event_repository::SqliteEventRepository;
pub use location_repository::SqliteLocationRepository;
pub use migration::{
    create_tables, current_version, destroy_tables, revert_migrations, run_migrations,
};
pub use transaction::Tx;

// Note: sqlx::Error conversion is handled by map_db_error at the handler boundary
// due to Rust's orphan rules (cannot implement From<sqlx::Error> for AppError here)
