// SQLite Connection Pool Setup and instrumented Connection

use crate::config::DatabaseConfig;
use crate::error::DbError;
use crate::transaction::Tx;
use artistdb_core::error::{AppError, Result};
use artistdb_core::port::Metrics;
use sqlx::query::{Query, QueryAs};
use sqlx::sqlite::{
    SqliteArguments, SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions,
    SqliteQueryResult, SqliteRow,
};
use sqlx::{Connection as _, FromRow, Sqlite};
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;

/// Command names used for duration metrics and `db.<command>` spans
pub mod command {
    pub const PING: &str = "ping";
    pub const BEGIN: &str = "begin";
    pub const QUERY: &str = "query";
    pub const EXEC: &str = "exec";
    pub const COMMIT: &str = "commit";
    pub const ROLLBACK: &str = "rollback";
    pub const SAVEPOINT: &str = "savepoint";
}

/// Create SQLite connection pool with foreign keys enforced on every connection
pub async fn create_pool(config: &DatabaseConfig) -> Result<SqlitePool> {
    config.validate()?;

    let mut options = SqliteConnectOptions::from_str(&config.url)
        .map_err(|e| AppError::Config(format!("invalid database url {:?}: {}", config.url, e)))?
        .busy_timeout(Duration::from_secs(5))
        .foreign_keys(true)
        .create_if_missing(true);

    let mut pool_options = SqlitePoolOptions::new()
        .max_connections(config.pool_size())
        .acquire_timeout(config.command_timeout);

    if config.is_in_memory() {
        // The database lives exactly as long as its connection
        pool_options = pool_options
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    } else {
        options = options.journal_mode(SqliteJournalMode::Wal);
    }

    pool_options
        .connect_with(options)
        .await
        .map_err(|e| AppError::Database(format!("connect {}: {}", config.url, e)))
}

/// Timing, timeout, span and metrics around every database command
#[derive(Clone)]
pub(crate) struct Instrumentation {
    metrics: Arc<dyn Metrics>,
    command_timeout: Duration,
    rollback_timeout: Duration,
}

impl Instrumentation {
    pub(crate) fn rollback_timeout(&self) -> Duration {
        self.rollback_timeout
    }

    pub(crate) async fn run<T, F>(
        &self,
        command: &'static str,
        fut: F,
    ) -> std::result::Result<T, DbError>
    where
        F: Future<Output = std::result::Result<T, sqlx::Error>>,
    {
        self.run_within(command, self.command_timeout, fut).await
    }

    pub(crate) async fn run_within<T, F>(
        &self,
        command: &'static str,
        limit: Duration,
        fut: F,
    ) -> std::result::Result<T, DbError>
    where
        F: Future<Output = std::result::Result<T, sqlx::Error>>,
    {
        let span = tracing::debug_span!(
            "db.command",
            otel.name = %format!("db.{}", command),
            db.command = command,
            error = tracing::field::Empty,
        );

        let started = Instant::now();
        let outcome = match tokio::time::timeout(limit, fut).instrument(span.clone()).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(DbError::Driver(e)),
            Err(_) => Err(DbError::Timeout {
                command,
                after: limit,
            }),
        };

        self.metrics.observe_command_duration(command, started.elapsed());
        if let Err(e) = &outcome {
            span.record("error", tracing::field::display(e));
            self.metrics.track_command_error(command);
        }

        outcome
    }
}

/// Pooled SQLite connection shared by all handlers
pub struct Connection {
    pool: SqlitePool,
    instr: Instrumentation,
}

impl Connection {
    pub fn new(pool: SqlitePool, metrics: Arc<dyn Metrics>, config: &DatabaseConfig) -> Self {
        Self {
            pool,
            instr: Instrumentation {
                metrics,
                command_timeout: config.command_timeout,
                rollback_timeout: config.rollback_timeout,
            },
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn metrics(&self) -> &Arc<dyn Metrics> {
        &self.instr.metrics
    }

    /// Round trip to the database on a pooled connection
    pub async fn ping(&self) -> std::result::Result<(), DbError> {
        self.instr
            .run(command::PING, async {
                let mut conn = self.pool.acquire().await?;
                conn.ping().await
            })
            .await
    }

    /// Start a transaction. Dropping the returned handle without commit rolls it back.
    pub async fn begin(&self) -> std::result::Result<Tx<'static>, DbError> {
        let tx = self.instr.run(command::BEGIN, self.pool.begin()).await?;
        Ok(Tx::new(tx, self.instr.clone()))
    }

    /// Fetch all rows
    pub async fn query<'q, O>(
        &self,
        query: QueryAs<'q, Sqlite, O, SqliteArguments<'q>>,
    ) -> std::result::Result<Vec<O>, DbError>
    where
        O: Send + Unpin + for<'r> FromRow<'r, SqliteRow>,
    {
        self.instr.run(command::QUERY, query.fetch_all(&self.pool)).await
    }

    /// Fetch at most one row
    pub async fn query_row<'q, O>(
        &self,
        query: QueryAs<'q, Sqlite, O, SqliteArguments<'q>>,
    ) -> std::result::Result<Option<O>, DbError>
    where
        O: Send + Unpin + for<'r> FromRow<'r, SqliteRow>,
    {
        self.instr
            .run(command::QUERY, query.fetch_optional(&self.pool))
            .await
    }

    pub async fn exec<'q>(
        &self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> std::result::Result<SqliteQueryResult, DbError> {
        self.instr.run(command::EXEC, query.execute(&self.pool)).await
    }

    /// Close the pool. Calling it again is a no-op.
    pub async fn close(&self) {
        if !self.pool.is_closed() {
            self.pool.close().await;
        }
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use artistdb_core::port::InMemoryMetrics;

    async fn memory_connection() -> (Connection, Arc<InMemoryMetrics>) {
        let config = DatabaseConfig::in_memory();
        let pool = create_pool(&config).await.unwrap();
        let metrics = Arc::new(InMemoryMetrics::new());
        (Connection::new(pool, metrics.clone(), &config), metrics)
    }

    #[tokio::test]
    async fn test_create_pool() {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        assert!(pool.acquire().await.is_ok());
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled() {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        let enabled: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[tokio::test]
    async fn test_commands_are_measured() {
        let (conn, metrics) = memory_connection().await;

        conn.ping().await.unwrap();
        conn.exec(sqlx::query("CREATE TABLE t (v INTEGER)"))
            .await
            .unwrap();
        let err = conn
            .exec(sqlx::query("INSERT INTO missing VALUES (1)"))
            .await
            .unwrap_err();
        assert!(!err.aborts_transaction());

        let rows: Vec<(i64,)> = conn
            .query(sqlx::query_as("SELECT v FROM t"))
            .await
            .unwrap();
        assert!(rows.is_empty());

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.command(command::PING).count, 1);
        assert_eq!(snapshot.command(command::EXEC).count, 2);
        assert_eq!(snapshot.command(command::EXEC).errors, 1);
        assert_eq!(snapshot.command(command::QUERY).count, 1);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (conn, _) = memory_connection().await;
        conn.close().await;
        conn.close().await;
        assert!(conn.is_closed());
        assert!(conn.ping().await.is_err());
    }
}
