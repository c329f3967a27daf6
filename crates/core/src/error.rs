// Central Error Type for the Application

use std::fmt;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0}")]
    AggregatedWrite(WriteErrors),

    #[error("Transaction aborted: {0}")]
    TransactionAborted(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Discriminant of [`AppError`], used by callers that branch on the kind only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidIdentifier,
    NotFound,
    Validation,
    AggregatedWrite,
    TransactionAborted,
    Database,
    Config,
    Internal,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::InvalidIdentifier(_) => ErrorKind::InvalidIdentifier,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::AggregatedWrite(_) => ErrorKind::AggregatedWrite,
            AppError::TransactionAborted(_) => ErrorKind::TransactionAborted,
            AppError::Database(_) => ErrorKind::Database,
            AppError::Config(_) => ErrorKind::Config,
            AppError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn is_invalid_identifier(&self) -> bool {
        self.kind() == ErrorKind::InvalidIdentifier
    }
}

/// A single failed row of a batch write.
#[derive(Debug)]
pub struct RowError {
    /// Position of the entity in the submitted batch
    pub index: usize,
    /// Identifier the entity carried (possibly malformed)
    pub id: String,
    pub cause: AppError,
}

/// Accumulates per-row failures of a multi-entity upsert.
///
/// Rows not listed here were written; the surrounding transaction still commits.
#[derive(Debug, Default)]
pub struct WriteErrors {
    rows: Vec<RowError>,
}

impl WriteErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, index: usize, id: impl Into<String>, cause: AppError) {
        self.rows.push(RowError {
            index,
            id: id.into(),
            cause,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[RowError] {
        &self.rows
    }

    /// Whether any row failed with the given kind.
    pub fn contains_kind(&self, kind: ErrorKind) -> bool {
        self.rows.iter().any(|row| row.cause.kind() == kind)
    }

    /// Whether the row at `index` of the batch failed.
    pub fn failed_at(&self, index: usize) -> bool {
        self.rows.iter().any(|row| row.index == index)
    }

    /// `Ok(())` when nothing failed, otherwise the aggregated error.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::AggregatedWrite(self))
        }
    }
}

impl fmt::Display for WriteErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} row(s) failed", self.rows.len())?;
        for row in &self.rows {
            write!(f, "; [{}] {}: {}", row.index, row.id, row.cause)?;
        }
        Ok(())
    }
}
