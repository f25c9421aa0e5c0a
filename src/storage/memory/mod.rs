//! In-memory LedgerStore implementation.
//!
//! Used for tests and for the `memory` storage type. State lives behind a
//! single `RwLock`, so every query sees one consistent snapshot and every
//! commit is applied as a unit.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::ledger::{EntryId, LedgerBatch, LedgerEntry, NewEntry};
use crate::storage::{EntryFilter, LedgerStore, Result, StorageError};

#[derive(Default)]
struct MemoryState {
    /// Kept in insertion order; `entries[i].id == EntryId(i + 1)`.
    entries: Vec<LedgerEntry>,
}

impl MemoryState {
    fn position(&self, id: EntryId) -> Option<usize> {
        let index = usize::try_from(id.0).ok()?.checked_sub(1)?;
        (index < self.entries.len()).then_some(index)
    }

    fn append(&mut self, entry: NewEntry) -> EntryId {
        let id = EntryId(self.entries.len() as i64 + 1);
        self.entries.push(entry.into_entry(id));
        id
    }
}

/// Ledger store that keeps entries in memory.
#[derive(Default)]
pub struct MemoryLedgerStore {
    state: RwLock<MemoryState>,
    fail_on_commit: RwLock<bool>,
    fail_on_query: RwLock<bool>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `commit`, `insert` and `update_remaining` calls fail.
    pub async fn set_fail_on_commit(&self, fail: bool) {
        *self.fail_on_commit.write().await = fail;
    }

    /// Make subsequent `query` calls fail.
    pub async fn set_fail_on_query(&self, fail: bool) {
        *self.fail_on_query.write().await = fail;
    }

    pub async fn entry_count(&self) -> usize {
        self.state.read().await.entries.len()
    }

    async fn check_writable(&self) -> Result<()> {
        if *self.fail_on_commit.read().await {
            return Err(StorageError::Unavailable(
                "memory store rejecting writes".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn insert(&self, entry: NewEntry) -> Result<EntryId> {
        self.check_writable().await?;
        Ok(self.state.write().await.append(entry))
    }

    async fn update_remaining(&self, id: EntryId, remaining: Option<i64>) -> Result<()> {
        self.check_writable().await?;
        let mut state = self.state.write().await;
        let index = state.position(id).ok_or(StorageError::NotFound { id })?;
        state.entries[index].remaining = remaining;
        Ok(())
    }

    async fn query(&self, filter: &EntryFilter) -> Result<Vec<LedgerEntry>> {
        if *self.fail_on_query.read().await {
            return Err(StorageError::Unavailable(
                "memory store rejecting reads".to_string(),
            ));
        }

        let state = self.state.read().await;
        let mut entries: Vec<LedgerEntry> = state
            .entries
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        entries.sort_by(|a, b| (a.timestamp, a.id).cmp(&(b.timestamp, b.id)));
        Ok(entries)
    }

    async fn commit(&self, batch: LedgerBatch) -> Result<Vec<EntryId>> {
        self.check_writable().await?;
        let mut state = self.state.write().await;

        // Resolve and check every update before mutating so a rejected
        // batch leaves no trace.
        let mut positions = Vec::with_capacity(batch.updates.len());
        for update in &batch.updates {
            let index = state
                .position(update.id)
                .ok_or(StorageError::NotFound { id: update.id })?;
            if state.entries[index].remaining != update.expected {
                return Err(StorageError::Conflict { id: update.id });
            }
            positions.push((index, update.remaining));
        }

        for (index, remaining) in positions {
            state.entries[index].remaining = remaining;
        }

        Ok(batch
            .inserts
            .into_iter()
            .map(|entry| state.append(entry))
            .collect())
    }
}
