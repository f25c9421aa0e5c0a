//! Ledger services.

pub mod points_ledger;

pub use points_ledger::PointsLedger;
