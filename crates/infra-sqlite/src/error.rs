// Driver errors and their mapping to AppError
//
// AppError lives in core and cannot depend on sqlx, so handlers convert at
// their boundary with map_db_error / map_write_error.

use artistdb_core::error::AppError;
use std::time::Duration;
use thiserror::Error;

/// Error of a single Connection / Tx command
#[derive(Error, Debug)]
pub enum DbError {
    /// Unchanged driver error
    #[error(transparent)]
    Driver(#[from] sqlx::Error),

    #[error("{command} timed out after {after:?}")]
    Timeout {
        command: &'static str,
        after: Duration,
    },
}

impl DbError {
    /// Whether the transaction the command ran in can no longer be used.
    ///
    /// A timed out statement was dropped mid-flight, so the state of the
    /// connection is unknown.
    pub fn aborts_transaction(&self) -> bool {
        match self {
            DbError::Timeout { .. } => true,
            DbError::Driver(err) => matches!(
                err,
                sqlx::Error::Io(_)
                    | sqlx::Error::Protocol(_)
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::WorkerCrashed
            ),
        }
    }
}

/// Map a command error to an opaque storage error carrying `context`
/// (`<entity>.<operation>`).
pub(crate) fn map_db_error(err: DbError, context: &str) -> AppError {
    let err = match err {
        DbError::Timeout { .. } => {
            return AppError::Database(format!("{}: {}", context, err));
        }
        DbError::Driver(err) => err,
    };

    match &err {
        sqlx::Error::Database(db_err) => {
            if let Some(code) = db_err.code() {
                let code_str = code.as_ref();

                // SQLite extended result codes: https://www.sqlite.org/rescode.html
                match code_str {
                    "2067" | "1555" => AppError::Database(format!(
                        "{}: Unique constraint violation: {} ({})",
                        context,
                        db_err.message(),
                        code_str
                    )),
                    "787" | "3850" => AppError::Database(format!(
                        "{}: Foreign key constraint violation: {} ({})",
                        context,
                        db_err.message(),
                        code_str
                    )),
                    "275" | "1299" => AppError::Database(format!(
                        "{}: Constraint violation: {} ({})",
                        context,
                        db_err.message(),
                        code_str
                    )),
                    "5" | "517" => AppError::Database(format!(
                        "{}: Database locked (SQLITE_BUSY): {}",
                        context,
                        db_err.message()
                    )),
                    _ => AppError::Database(format!(
                        "{}: Database error [{}]: {}",
                        context,
                        code_str,
                        db_err.message()
                    )),
                }
            } else {
                AppError::Database(format!("{}: Database error: {}", context, db_err.message()))
            }
        }
        sqlx::Error::ColumnNotFound(col) => {
            AppError::Database(format!("{}: Column not found: {}", context, col))
        }
        _ => AppError::Database(format!("{}: {}", context, err)),
    }
}

/// Like [`map_db_error`], but a command that took the transaction down
/// becomes [`AppError::TransactionAborted`].
pub(crate) fn map_write_error(err: DbError, context: &str) -> AppError {
    if err.aborts_transaction() {
        AppError::TransactionAborted(format!("{}: {}", context, err))
    } else {
        map_db_error(err, context)
    }
}
