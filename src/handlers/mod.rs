//! Request handlers in front of the ledger service.

pub mod commands;
