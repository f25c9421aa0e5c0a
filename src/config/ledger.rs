//! Ledger policy configuration.

use serde::Deserialize;

/// Which batches a single-payer spend may draw from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpendHorizon {
    /// Only batches timestamped at or before the spend.
    #[default]
    EventTime,
    /// Any batch with remaining points, whatever its timestamp.
    Unbounded,
}

/// Ledger policy configuration.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub spend_horizon: SpendHorizon,
}
