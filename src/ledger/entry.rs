//! Ledger entry types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned identifier of a ledger entry.
///
/// Ids grow with insertion order, so `(timestamp, id)` is a total order
/// that breaks timestamp ties by arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub i64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One recorded earn (positive points) or spend (negative points).
///
/// `points`, `payer` and `timestamp` never change after creation; only
/// `remaining` is mutated by later allocations.
///
/// `remaining` semantics:
/// - earn: unconsumed points, `0..=points`
/// - spend: `None` when fully matched, negative for outstanding debt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: EntryId,
    pub payer: String,
    pub points: i64,
    pub timestamp: DateTime<Utc>,
    pub remaining: Option<i64>,
}

impl LedgerEntry {
    /// Points this entry can still give to a spend.
    pub fn available(&self) -> i64 {
        self.remaining.filter(|r| *r > 0).unwrap_or(0)
    }

    /// Unmatched debt carried by this entry, as a positive number.
    pub fn outstanding_debt(&self) -> i64 {
        self.remaining.filter(|r| *r < 0).map(|r| -r).unwrap_or(0)
    }
}

/// An entry before the store has assigned it an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub payer: String,
    pub points: i64,
    pub timestamp: DateTime<Utc>,
    pub remaining: Option<i64>,
}

impl NewEntry {
    pub fn into_entry(self, id: EntryId) -> LedgerEntry {
        LedgerEntry {
            id,
            payer: self.payer,
            points: self.points,
            timestamp: self.timestamp,
            remaining: self.remaining,
        }
    }
}

/// A planned change to an existing entry's `remaining` field.
///
/// `expected` is the value the plan was computed from. Stores apply the
/// update only while the entry still holds it, and fail the whole batch
/// with `StorageError::Conflict` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemainingUpdate {
    pub id: EntryId,
    pub expected: Option<i64>,
    pub remaining: Option<i64>,
}

/// Everything a single ledger operation writes.
///
/// Stores apply a batch atomically: either every update and insert is
/// visible afterwards, or none is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerBatch {
    pub updates: Vec<RemainingUpdate>,
    pub inserts: Vec<NewEntry>,
}

impl LedgerBatch {
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.inserts.is_empty()
    }
}

/// Points drawn from one payer by a global spend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayerSpend {
    pub payer: String,
    pub points: i64,
}
