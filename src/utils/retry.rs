//! Retry utilities: backoff for optimistic commit conflicts.
//!
//! Uses `backon` for exponential backoff with jitter.

use std::time::Duration;

use backon::ExponentialBuilder;

use crate::ledger::LedgerError;
use crate::storage::StorageError;

/// Backoff for re-planning a write after another writer changed its entries.
///
/// - Min delay: 5ms
/// - Max delay: 1s
/// - Max attempts: 10
/// - Jitter enabled
pub fn conflict_backoff() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(5))
        .with_max_delay(Duration::from_secs(1))
        .with_max_times(10)
        .with_jitter()
}

/// Determines if a ledger error is retryable (commit conflict only).
///
/// Validation errors, insufficient points and other storage failures will
/// not change on retry.
pub fn is_conflict(err: &LedgerError) -> bool {
    matches!(err, LedgerError::Storage(StorageError::Conflict { .. }))
}
