//! LedgerStore trait definition.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::Result;
use crate::ledger::{EntryId, LedgerBatch, LedgerEntry, NewEntry};

/// Which `remaining` values a query selects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RemainingFilter {
    /// Every entry.
    #[default]
    Any,
    /// `remaining > 0`: batches that can still be spent.
    Positive,
    /// `remaining < 0`: spends with outstanding debt.
    Negative,
    /// `remaining` is set, whatever its sign.
    NotNull,
}

impl RemainingFilter {
    pub fn matches(&self, remaining: Option<i64>) -> bool {
        match self {
            RemainingFilter::Any => true,
            RemainingFilter::Positive => remaining.is_some_and(|r| r > 0),
            RemainingFilter::Negative => remaining.is_some_and(|r| r < 0),
            RemainingFilter::NotNull => remaining.is_some(),
        }
    }
}

/// Selection criteria for [`LedgerStore::query`].
///
/// Both timestamp bounds are inclusive. Unset fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFilter {
    pub payer: Option<String>,
    pub remaining: RemainingFilter,
    pub from: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl EntryFilter {
    /// Match every entry.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn payer(mut self, payer: impl Into<String>) -> Self {
        self.payer = Some(payer.into());
        self
    }

    pub fn remaining(mut self, remaining: RemainingFilter) -> Self {
        self.remaining = remaining;
        self
    }

    pub fn from(mut self, from: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn matches(&self, entry: &LedgerEntry) -> bool {
        self.payer.as_deref().map_or(true, |p| p == entry.payer)
            && self.remaining.matches(entry.remaining)
            && self.from.map_or(true, |from| entry.timestamp >= from)
            && self.until.map_or(true, |until| entry.timestamp <= until)
    }
}

/// Interface for ledger entry persistence.
///
/// Entries are never deleted, and only their `remaining` field changes
/// after insert. Queries return entries ordered by `(timestamp, id)`
/// ascending, so entries sharing a timestamp come back in insertion order.
///
/// Implementations:
/// - `MemoryLedgerStore`: in-memory storage, also used in tests
/// - `SqliteLedgerStore`: SQLite storage
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Append a new entry and return its assigned id.
    async fn insert(&self, entry: NewEntry) -> Result<EntryId>;

    /// Overwrite the `remaining` field of an existing entry.
    ///
    /// Fails with `StorageError::NotFound` when no entry has this id.
    async fn update_remaining(&self, id: EntryId, remaining: Option<i64>) -> Result<()>;

    /// Retrieve entries matching `filter`, ordered by `(timestamp, id)`.
    async fn query(&self, filter: &EntryFilter) -> Result<Vec<LedgerEntry>>;

    /// Apply a batch of updates and inserts atomically.
    ///
    /// Returns the ids assigned to `batch.inserts`, in order. If any update
    /// targets an unknown id, or the backend fails midway, nothing from the
    /// batch is applied.
    async fn commit(&self, batch: LedgerBatch) -> Result<Vec<EntryId>>;
}
