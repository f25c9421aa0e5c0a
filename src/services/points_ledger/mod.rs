//! Points ledger service.
//!
//! Binds the pure planners in [`crate::ledger`] to a [`LedgerStore`]. Each
//! write follows the same cycle: validate, take the write gate, read the
//! candidate entries, plan, then commit everything as one batch.
//!
//! The write gate serializes `record_event` and `spend` within this
//! instance. Other writers on the same store (a second instance, or another
//! process on the same SQLite file) are caught at commit: every update
//! carries the `remaining` it was planned from, the store rejects the batch
//! with `StorageError::Conflict` if that value moved, and the whole cycle is
//! retried with backoff. Reads (`balances`, `entries`) skip the gate and rely
//! on the store answering each query from a single consistent snapshot.

use std::sync::Arc;
use std::time::Duration;

use backon::Retryable;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::{LedgerConfig, SpendHorizon};
use crate::ledger::{
    aggregate_balances, allocate_earn, allocate_spend, plan_distribution, Balances, EntryId,
    LedgerBatch, LedgerEntry, LedgerError, NewEntry, PayerSpend, Result,
};
use crate::storage::{EntryFilter, LedgerStore, RemainingFilter, StorageError};
use crate::utils::retry::{conflict_backoff, is_conflict};
use crate::validation::{validate_event, validate_spend_total};

/// Loyalty points ledger over an injected store.
pub struct PointsLedger {
    store: Arc<dyn LedgerStore>,
    config: LedgerConfig,
    write_gate: Mutex<()>,
}

impl PointsLedger {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self::with_config(store, LedgerConfig::default())
    }

    pub fn with_config(store: Arc<dyn LedgerStore>, config: LedgerConfig) -> Self {
        Self {
            store,
            config,
            write_gate: Mutex::new(()),
        }
    }

    /// Record an earn (`points > 0`) or a payer-specific spend (`points < 0`).
    ///
    /// An earn first pays down the payer's outstanding debts timestamped at
    /// or after it, oldest first. A spend consumes the payer's oldest
    /// available batches; any shortfall is kept on the new entry as debt
    /// rather than rejected.
    ///
    /// Returns the id of the new entry.
    #[tracing::instrument(name = "ledger.record", skip_all, fields(%payer, points, %timestamp))]
    pub async fn record_event(
        &self,
        payer: &str,
        points: i64,
        timestamp: DateTime<Utc>,
    ) -> Result<EntryId> {
        validate_event(payer, points)?;

        (|| async { self.try_record_event(payer, points, timestamp).await })
            .retry(conflict_backoff())
            .when(is_conflict)
            .notify(|err: &LedgerError, dur: Duration| {
                warn!(error = %err, delay = ?dur, "Event conflicted with another writer, retrying");
            })
            .await
    }

    /// One read-plan-commit attempt for `record_event`.
    async fn try_record_event(
        &self,
        payer: &str,
        points: i64,
        timestamp: DateTime<Utc>,
    ) -> Result<EntryId> {
        let _gate = self.write_gate.lock().await;

        let allocation = if points > 0 {
            let filter = EntryFilter::all()
                .payer(payer)
                .remaining(RemainingFilter::Negative)
                .from(timestamp);
            let debts = self.store.query(&filter).await?;
            allocate_earn(points, &debts)
        } else {
            let mut filter = EntryFilter::all()
                .payer(payer)
                .remaining(RemainingFilter::Positive);
            if self.config.spend_horizon == SpendHorizon::EventTime {
                filter = filter.until(timestamp);
            }
            let batches = self.store.query(&filter).await?;
            allocate_spend(points, &batches)
        };

        debug!(
            updates = allocation.updates.len(),
            remaining = ?allocation.remaining,
            "Allocated event"
        );
        if let Some(debt) = allocation.remaining.filter(|r| *r < 0) {
            info!(debt = -debt, "Spend exceeds available points, recording outstanding debt");
        }

        let batch = LedgerBatch {
            updates: allocation.updates,
            inserts: vec![NewEntry {
                payer: payer.to_string(),
                points,
                timestamp,
                remaining: allocation.remaining,
            }],
        };

        let ids = self.store.commit(batch).await?;
        ids.into_iter().next().ok_or_else(|| {
            StorageError::Unavailable("commit returned no id for the new entry".to_string())
                .into()
        })
    }

    /// Spend `total` points across all payers, oldest points first, now.
    pub async fn spend(&self, total: i64) -> Result<Vec<PayerSpend>> {
        self.spend_at(total, Utc::now()).await
    }

    /// Spend `total` points across all payers as of `timestamp`.
    ///
    /// All or nothing: on success every consumed batch is updated and one
    /// spend entry per contributing payer is appended, all stamped with
    /// `timestamp`. If the ledger holds fewer than `total` available points
    /// the call fails with [`LedgerError::InsufficientPoints`] and writes
    /// nothing.
    ///
    /// The result lists each payer once, in the order they were first drawn
    /// from, with the positive amount taken.
    #[tracing::instrument(name = "ledger.spend", skip_all, fields(total, %timestamp))]
    pub async fn spend_at(&self, total: i64, timestamp: DateTime<Utc>) -> Result<Vec<PayerSpend>> {
        validate_spend_total(total)?;

        (|| async { self.try_spend_at(total, timestamp).await })
            .retry(conflict_backoff())
            .when(is_conflict)
            .notify(|err: &LedgerError, dur: Duration| {
                warn!(error = %err, delay = ?dur, "Spend conflicted with another writer, retrying");
            })
            .await
    }

    /// One read-plan-commit attempt for `spend_at`.
    async fn try_spend_at(&self, total: i64, timestamp: DateTime<Utc>) -> Result<Vec<PayerSpend>> {
        let _gate = self.write_gate.lock().await;

        let filter = EntryFilter::all().remaining(RemainingFilter::Positive);
        let batches = self.store.query(&filter).await?;

        let plan = plan_distribution(total, &batches).map_err(|shortfall| {
            warn!(
                requested = shortfall.requested,
                available = shortfall.available,
                "Insufficient points for spend"
            );
            LedgerError::InsufficientPoints {
                requested: shortfall.requested,
                available: shortfall.available,
            }
        })?;

        let inserts = plan
            .spent
            .iter()
            .map(|line| NewEntry {
                payer: line.payer.clone(),
                points: -line.points,
                timestamp,
                remaining: None,
            })
            .collect();

        self.store
            .commit(LedgerBatch {
                updates: plan.updates,
                inserts,
            })
            .await?;

        info!(payers = plan.spent.len(), "Spend committed");
        Ok(plan.spent)
    }

    /// Current net balance per payer.
    #[tracing::instrument(name = "ledger.balances", skip_all)]
    pub async fn balances(&self) -> Result<Balances> {
        let filter = EntryFilter::all().remaining(RemainingFilter::NotNull);
        let entries = self.store.query(&filter).await?;
        Ok(aggregate_balances(&entries)?)
    }

    /// Every entry, ordered by `(timestamp, id)`.
    pub async fn entries(&self) -> Result<Vec<LedgerEntry>> {
        Ok(self.store.query(&EntryFilter::all()).await?)
    }
}
