// SQLite Transaction handle

use crate::connection::{command, Instrumentation};
use crate::error::DbError;
use sqlx::query::{Query, QueryAs};
use sqlx::sqlite::{SqliteArguments, SqliteQueryResult, SqliteRow};
use sqlx::{Connection as _, FromRow, Sqlite, Transaction};

/// Open transaction (or savepoint) with instrumented commands.
///
/// Dropping it without [`Tx::commit`] rolls it back once the connection is
/// next used or returned to the pool; this also covers panics and cancelled
/// futures.
pub struct Tx<'c> {
    inner: Transaction<'c, Sqlite>,
    instr: Instrumentation,
}

impl<'c> Tx<'c> {
    pub(crate) fn new(inner: Transaction<'c, Sqlite>, instr: Instrumentation) -> Self {
        Self { inner, instr }
    }

    pub async fn exec<'q>(
        &mut self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Result<SqliteQueryResult, DbError> {
        self.instr
            .run(command::EXEC, query.execute(&mut *self.inner))
            .await
    }

    pub async fn query_row<'q, O>(
        &mut self,
        query: QueryAs<'q, Sqlite, O, SqliteArguments<'q>>,
    ) -> Result<Option<O>, DbError>
    where
        O: Send + Unpin + for<'r> FromRow<'r, SqliteRow>,
    {
        self.instr
            .run(command::QUERY, query.fetch_optional(&mut *self.inner))
            .await
    }

    /// Open a savepoint nested in this transaction.
    ///
    /// Committing the returned handle releases the savepoint, rolling it back
    /// undoes only what ran inside it.
    pub async fn savepoint(&mut self) -> Result<Tx<'_>, DbError> {
        let inner = self
            .instr
            .run(command::SAVEPOINT, self.inner.begin())
            .await?;
        Ok(Tx {
            inner,
            instr: self.instr.clone(),
        })
    }

    pub async fn commit(self) -> Result<(), DbError> {
        let Tx { inner, instr } = self;
        instr.run(command::COMMIT, inner.commit()).await
    }

    /// Roll back, bounded by the rollback timeout rather than the command timeout
    pub async fn rollback(self) -> Result<(), DbError> {
        let Tx { inner, instr } = self;
        let limit = instr.rollback_timeout();
        instr
            .run_within(command::ROLLBACK, limit, inner.rollback())
            .await
    }

    /// Roll back on an error path. Failures are logged, never returned, so
    /// they cannot mask the error that caused the rollback.
    pub(crate) async fn rollback_logged(self, context: &str) {
        if let Err(e) = self.rollback().await {
            tracing::error!(context = %context, error = %e, "Rollback failed");
        }
    }
}
