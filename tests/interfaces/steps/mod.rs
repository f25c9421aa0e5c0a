//! Cucumber step definitions for interface tests.

pub mod points_ledger;
