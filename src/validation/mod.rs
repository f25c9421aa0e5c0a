//! Input validation for ledger operations.
//!
//! Every check here runs before the store is touched, so a rejected call
//! never reads or writes ledger state.

use thiserror::Error;

/// Length limits for validated fields.
pub mod limits {
    /// Maximum payer name length in bytes.
    pub const MAX_PAYER_LENGTH: usize = 256;
}

/// Malformed input rejected before any store access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("payer cannot be empty")]
    EmptyPayer,

    #[error("payer exceeds maximum length (max: {max}, got: {actual})")]
    PayerTooLong { max: usize, actual: usize },

    #[error("points cannot be zero")]
    ZeroPoints,

    #[error("points out of range (got: {0})")]
    PointsOutOfRange(i64),

    #[error("spend total must be positive (got: {0})")]
    NonPositiveSpend(i64),
}

/// Validate a payer name.
///
/// Rules:
/// - Must contain at least one non-whitespace character
/// - Maximum 256 bytes
pub fn validate_payer(payer: &str) -> Result<(), ValidationError> {
    if payer.trim().is_empty() {
        return Err(ValidationError::EmptyPayer);
    }
    if payer.len() > limits::MAX_PAYER_LENGTH {
        return Err(ValidationError::PayerTooLong {
            max: limits::MAX_PAYER_LENGTH,
            actual: payer.len(),
        });
    }
    Ok(())
}

/// Validate an earn/spend event before allocation.
pub fn validate_event(payer: &str, points: i64) -> Result<(), ValidationError> {
    validate_payer(payer)?;
    if points == 0 {
        return Err(ValidationError::ZeroPoints);
    }
    // A spend is stored and allocated as its magnitude, which i64::MIN lacks.
    if points == i64::MIN {
        return Err(ValidationError::PointsOutOfRange(points));
    }
    Ok(())
}

/// Validate the total of a global spend.
pub fn validate_spend_total(total: i64) -> Result<(), ValidationError> {
    if total <= 0 {
        return Err(ValidationError::NonPositiveSpend(total));
    }
    Ok(())
}
