// Batch upsert protocol shared by all handlers
//
// One transaction per call, one savepoint per row. A failed row is rolled
// back to its savepoint and recorded; the loop only stops when the
// transaction itself is gone.

use crate::connection::Connection;
use crate::error::{map_db_error, map_write_error, DbError};
use crate::transaction::Tx;
use artistdb_core::error::{AppError, ErrorKind, Result, WriteErrors};
use artistdb_core::port::TimeProvider;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

pub(crate) const UPSERT: &str = "upsert";

/// Writes a single entity of type `T` (plus its dependent rows) inside an
/// open savepoint.
#[async_trait]
pub(crate) trait RowWriter<T: Send + Sync>: Send + Sync {
    /// Entity name for metrics, spans and error context
    const ENTITY: &'static str;

    fn id_of(item: &T) -> &str;

    /// Checks that need no I/O. Returns the row as it is written, with
    /// identifiers in canonical form.
    fn prepare(item: &T) -> Result<T>;

    async fn write_row(
        &self,
        tx: &mut Tx<'_>,
        item: &T,
        now: DateTime<Utc>,
    ) -> std::result::Result<(), DbError>;
}

/// Upsert `items` in one transaction, aggregating per-row failures.
pub(crate) async fn upsert_all<T, W>(
    conn: &Connection,
    writer: &W,
    clock: &dyn TimeProvider,
    items: &[T],
) -> Result<()>
where
    T: Send + Sync,
    W: RowWriter<T>,
{
    let entity = W::ENTITY;
    let context = format!("{}.{}", entity, UPSERT);
    let metrics = conn.metrics();

    if items.is_empty() {
        return Ok(());
    }

    let mut tx = conn.begin().await.map_err(|e| {
        metrics.track_object_error(entity, UPSERT);
        map_write_error(e, &context)
    })?;

    let mut errors = WriteErrors::new();

    for (index, item) in items.iter().enumerate() {
        let id = W::id_of(item);

        let outcome = match W::prepare(item) {
            Ok(row) => write_one(writer, &mut tx, &row, clock.now(), &context).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => {}
            Err(cause) if cause.kind() == ErrorKind::TransactionAborted => {
                warn!(entity, index, id = %id, error = %cause, "Upsert aborted");
                metrics.track_object_error(entity, UPSERT);
                tx.rollback_logged(&context).await;
                return Err(cause);
            }
            Err(cause) => {
                debug!(entity, index, id = %id, error = %cause, "Row rejected");
                metrics.track_object_error(entity, UPSERT);
                errors.push(index, id, cause);
            }
        }
    }

    if let Err(e) = tx.commit().await {
        metrics.track_object_error(entity, UPSERT);
        return Err(map_db_error(e, &context));
    }

    let written = items.len() - errors.len();
    metrics.track_objects_changed(entity, UPSERT, written);
    debug!(entity, written, failed = errors.len(), "Upsert committed");

    errors.into_result()
}

/// Write one row inside its own savepoint.
///
/// Errors that leave the transaction unusable come back as
/// [`AppError::TransactionAborted`].
async fn write_one<T, W>(
    writer: &W,
    tx: &mut Tx<'_>,
    item: &T,
    now: DateTime<Utc>,
    context: &str,
) -> Result<()>
where
    T: Send + Sync,
    W: RowWriter<T>,
{
    let mut sp = tx.savepoint().await.map_err(|e| {
        AppError::TransactionAborted(format!("{}: open savepoint: {}", context, e))
    })?;

    match writer.write_row(&mut sp, item, now).await {
        Ok(()) => sp.commit().await.map_err(|e| {
            AppError::TransactionAborted(format!("{}: release savepoint: {}", context, e))
        }),
        // The savepoint is dropped with the transaction
        Err(e) if e.aborts_transaction() => Err(map_write_error(e, context)),
        Err(e) => {
            sp.rollback().await.map_err(|re| {
                AppError::TransactionAborted(format!(
                    "{}: roll back to savepoint: {}",
                    context, re
                ))
            })?;
            Err(map_db_error(e, context))
        }
    }
}
