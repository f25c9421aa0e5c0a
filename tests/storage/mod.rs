//! Shared storage integration tests.
//!
//! Tests the LedgerStore interface against all implementations.
//! Each implementation module imports these test functions and runs them.
