//! Ledger operation errors.

use thiserror::Error;

use super::BalanceOverflow;
use crate::storage::StorageError;
use crate::validation::ValidationError;

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors returned by [`PointsLedger`](crate::services::PointsLedger).
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("Insufficient points: requested {requested}, available {available}")]
    InsufficientPoints { requested: i64, available: i64 },

    #[error("Balance of {payer} exceeds the representable range")]
    BalanceOverflow { payer: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<BalanceOverflow> for LedgerError {
    fn from(overflow: BalanceOverflow) -> Self {
        LedgerError::BalanceOverflow {
            payer: overflow.payer,
        }
    }
}
