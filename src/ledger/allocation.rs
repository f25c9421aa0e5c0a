//! Oldest-first allocation of a single payer's earn or spend event.
//!
//! Both planners are pure: they read candidate entries (already filtered
//! and ordered by `(timestamp, id)`) and return the remaining-quantity
//! changes plus the `remaining` value the new entry should be stored with.
//! Nothing here touches a store.

use super::entry::{LedgerEntry, RemainingUpdate};

/// Outcome of allocating one event against existing entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Allocation {
    /// Changes to existing entries, in the order they were visited.
    pub updates: Vec<RemainingUpdate>,
    /// `remaining` for the entry representing the event itself.
    pub remaining: Option<i64>,
}

/// Allocate a positive `points` amount against outstanding debts.
///
/// `debts` must hold the payer's negative-remaining entries timestamped at
/// or after the earn, oldest first. Each debt is paid down in turn; a debt
/// that is more than covered is cleared to `None`, one covered exactly is
/// left at `0`. Whatever is not absorbed stays on the earn.
pub fn allocate_earn(points: i64, debts: &[LedgerEntry]) -> Allocation {
    let mut unallocated = points;
    let mut updates = Vec::new();

    for debt in debts {
        if unallocated <= 0 {
            break;
        }

        let owed = debt.outstanding_debt();
        if owed == 0 {
            continue;
        }

        if unallocated <= owed {
            updates.push(RemainingUpdate {
                id: debt.id,
                expected: debt.remaining,
                remaining: Some(unallocated - owed),
            });
            unallocated = 0;
        } else {
            updates.push(RemainingUpdate {
                id: debt.id,
                expected: debt.remaining,
                remaining: None,
            });
            unallocated -= owed;
        }
    }

    Allocation {
        updates,
        remaining: Some(unallocated),
    }
}

/// Allocate a negative `points` amount against available batches.
///
/// `batches` must hold the payer's positive-remaining entries, oldest
/// first. Demand that no batch can cover becomes outstanding debt on the
/// new entry.
pub fn allocate_spend(points: i64, batches: &[LedgerEntry]) -> Allocation {
    let (updates, to_distribute) = consume_oldest_first(-points, batches, |_, _| {});

    Allocation {
        updates,
        remaining: (to_distribute > 0).then_some(-to_distribute),
    }
}

/// Walk `batches` taking up to `demand` points, oldest first.
///
/// Calls `on_draw` with each batch and the amount taken from it. Returns
/// the updates and the demand left unmet.
pub(crate) fn consume_oldest_first<F>(
    demand: i64,
    batches: &[LedgerEntry],
    mut on_draw: F,
) -> (Vec<RemainingUpdate>, i64)
where
    F: FnMut(&LedgerEntry, i64),
{
    let mut to_distribute = demand;
    let mut updates = Vec::new();

    for batch in batches {
        if to_distribute <= 0 {
            break;
        }

        let available = batch.available();
        if available == 0 {
            continue;
        }

        let taken = to_distribute.min(available);
        updates.push(RemainingUpdate {
            id: batch.id,
            expected: batch.remaining,
            remaining: Some(available - taken),
        });
        on_draw(batch, taken);
        to_distribute -= taken;
    }

    (updates, to_distribute)
}
