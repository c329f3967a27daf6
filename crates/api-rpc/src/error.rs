//! RPC Error Types
//!
//! Maps application errors to JSON-RPC error codes.

use artistdb_core::error::AppError;
use jsonrpsee::types::ErrorObjectOwned;
use serde::Serialize;

/// RPC Error Codes
pub mod code {
    /// Malformed identifier or otherwise invalid input
    pub const INVALID_INPUT: i32 = 4000;
    pub const NOT_FOUND: i32 = 4001;
    pub const INTERNAL_ERROR: i32 = 5000;
}

/// Error data attached to an aggregated write failure, one entry per failed row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowErrorData {
    pub index: usize,
    pub id: String,
    pub message: String,
}

/// Convert AppError to JSON-RPC ErrorObject
pub fn to_rpc_error(err: AppError) -> ErrorObjectOwned {
    let message = err.to_string();

    match err {
        AppError::InvalidIdentifier(_) | AppError::Validation(_) => {
            ErrorObjectOwned::owned(code::INVALID_INPUT, message, None::<()>)
        }
        AppError::NotFound(_) => ErrorObjectOwned::owned(code::NOT_FOUND, message, None::<()>),
        AppError::AggregatedWrite(rows) => {
            let data: Vec<RowErrorData> = rows
                .rows()
                .iter()
                .map(|row| RowErrorData {
                    index: row.index,
                    id: row.id.clone(),
                    message: row.cause.to_string(),
                })
                .collect();
            ErrorObjectOwned::owned(code::INTERNAL_ERROR, message, Some(data))
        }
        AppError::TransactionAborted(_)
        | AppError::Database(_)
        | AppError::Config(_)
        | AppError::Internal(_) => {
            tracing::error!(error = %message, "Request failed");
            ErrorObjectOwned::owned(code::INTERNAL_ERROR, message, None::<()>)
        }
    }
}
