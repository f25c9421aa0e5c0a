//! Points ledger core.
//!
//! Entry types plus the pure planners that decide how earn and spend
//! events move points between entries:
//! - [`allocation`]: one payer's earn or spend, oldest first
//! - [`distribution`]: an all-or-nothing spend across every payer
//! - [`balances`]: per-payer sums of remaining points
//!
//! Planners never touch a store; [`PointsLedger`](crate::services::PointsLedger)
//! reads candidates, runs them and commits the result.

pub mod allocation;
pub mod balances;
pub mod distribution;
mod entry;
mod error;

pub use allocation::{allocate_earn, allocate_spend, Allocation};
pub use balances::{aggregate_balances, BalanceOverflow, Balances};
pub use distribution::{plan_distribution, DistributionPlan, Shortfall};
pub use entry::{EntryId, LedgerBatch, LedgerEntry, NewEntry, PayerSpend, RemainingUpdate};
pub use error::{LedgerError, Result};
