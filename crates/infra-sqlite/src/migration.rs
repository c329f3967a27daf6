// Migration Runner

use crate::config::DatabaseConfig;
use crate::connection::create_pool;
use artistdb_core::error::{AppError, Result};
use sqlx::SqlitePool;
use tracing::info;

struct Migration {
    version: i64,
    name: &'static str,
    up: &'static str,
    down: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "artists",
        up: include_str!("../migrations/001_artists.up.sql"),
        down: include_str!("../migrations/001_artists.down.sql"),
    },
    Migration {
        version: 2,
        name: "locations",
        up: include_str!("../migrations/002_locations.up.sql"),
        down: include_str!("../migrations/002_locations.down.sql"),
    },
    Migration {
        version: 3,
        name: "events",
        up: include_str!("../migrations/003_events.up.sql"),
        down: include_str!("../migrations/003_events.down.sql"),
    },
    Migration {
        version: 4,
        name: "invited_artists",
        up: include_str!("../migrations/004_invited_artists.up.sql"),
        down: include_str!("../migrations/004_invited_artists.down.sql"),
    },
];

fn migration_error(err: sqlx::Error) -> AppError {
    AppError::Database(format!("migration: {}", err))
}

/// Highest applied version, 0 for an empty schema
pub async fn current_version(pool: &SqlitePool) -> Result<i64> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY NOT NULL)",
    )
    .execute(pool)
    .await
    .map_err(migration_error)?;

    let version: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
        .fetch_one(pool)
        .await
        .map_err(migration_error)?;

    Ok(version.unwrap_or(0))
}

/// Apply all pending migrations. Already applied versions are skipped.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current = current_version(pool).await?;
    info!(current_version = current, "Running database migrations...");

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        info!(
            version = migration.version,
            name = migration.name,
            "Applying migration"
        );
        apply_migration(pool, migration.up, Step::Up(migration.version)).await?;
    }

    info!("All migrations applied successfully");
    Ok(())
}

/// Run the down scripts of all applied migrations, newest first.
/// Reverting an empty schema does nothing.
pub async fn revert_migrations(pool: &SqlitePool) -> Result<()> {
    let current = current_version(pool).await?;
    info!(current_version = current, "Reverting database migrations...");

    for migration in MIGRATIONS.iter().rev().filter(|m| m.version <= current) {
        info!(
            version = migration.version,
            name = migration.name,
            "Reverting migration"
        );
        apply_migration(pool, migration.down, Step::Down(migration.version)).await?;
    }

    Ok(())
}

/// Open `url`, migrate it up, close it again
pub async fn create_tables(url: &str) -> Result<()> {
    let pool = create_pool(&DatabaseConfig::new(url)).await?;
    let result = run_migrations(&pool).await;
    pool.close().await;
    result
}

/// Open `url`, migrate it all the way down, close it again
pub async fn destroy_tables(url: &str) -> Result<()> {
    let pool = create_pool(&DatabaseConfig::new(url)).await?;
    let result = revert_migrations(&pool).await;
    pool.close().await;
    result
}

enum Step {
    Up(i64),
    Down(i64),
}

/// Apply a single migration script together with its version bookkeeping
async fn apply_migration(pool: &SqlitePool, sql: &str, step: Step) -> Result<()> {
    let mut tx = pool.begin().await.map_err(migration_error)?;

    // Split by semicolon and execute each statement
    for statement in sql.split(';') {
        let clean_statement: String = statement
            .lines()
            .filter(|line| !line.trim().starts_with("--"))
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string();

        if !clean_statement.is_empty() {
            sqlx::query(&clean_statement)
                .execute(&mut *tx)
                .await
                .map_err(migration_error)?;
        }
    }

    let bookkeeping = match step {
        Step::Up(version) => {
            sqlx::query("INSERT INTO schema_version (version) VALUES (?)").bind(version)
        }
        Step::Down(version) => {
            sqlx::query("DELETE FROM schema_version WHERE version = ?").bind(version)
        }
    };
    bookkeeping
        .execute(&mut *tx)
        .await
        .map_err(migration_error)?;

    tx.commit().await.map_err(migration_error)?;
    Ok(())
}
