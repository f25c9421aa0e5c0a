//! Database schema definitions using sea-query.
//!
//! These define the table and column identifiers for type-safe query building.

use sea_query::Iden;

/// Ledger entries table schema.
#[derive(Iden)]
pub enum Entries {
    #[iden = "ledger_entries"]
    Table,
    #[iden = "id"]
    Id,
    #[iden = "payer"]
    Payer,
    #[iden = "points"]
    Points,
    #[iden = "timestamp"]
    Timestamp,
    #[iden = "remaining"]
    Remaining,
}

/// SQL for creating the ledger entries table.
///
/// `timestamp` holds fixed-width RFC 3339 UTC text, so lexical order is
/// chronological order. The store only writes years 0000 through 9999.
pub const CREATE_ENTRIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS ledger_entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    payer TEXT NOT NULL,
    points INTEGER NOT NULL CHECK (points <> 0),
    timestamp TEXT NOT NULL,
    remaining INTEGER
)
"#;

/// SQL for the payer/timestamp index used by allocation queries.
pub const CREATE_ENTRIES_PAYER_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_ledger_entries_payer_timestamp
    ON ledger_entries(payer, timestamp)
"#;
