//! pointledger - FIFO loyalty points ledger
//!
//! Records per-payer earn and spend events, pays down outstanding debt as
//! points arrive, spends across payers oldest points first, and reports
//! per-payer balances. Entries live behind a pluggable [`storage::LedgerStore`].

pub mod config;
pub mod handlers;
pub mod ledger;
pub mod services;
pub mod storage;
pub mod utils;
pub mod validation;
