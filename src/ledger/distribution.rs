//! Global spend planning across all payers.

use super::allocation::consume_oldest_first;
use super::entry::{PayerSpend, RemainingUpdate};
use super::LedgerEntry;

/// A fully satisfied global spend, ready to commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionPlan {
    pub updates: Vec<RemainingUpdate>,
    /// Points drawn per payer, in the order each payer was first drawn from.
    pub spent: Vec<PayerSpend>,
}

/// Demand that the available batches could not meet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortfall {
    pub requested: i64,
    pub available: i64,
}

/// Plan spending `total` points from `batches`, oldest first regardless of payer.
///
/// `batches` must be every positive-remaining entry in the ledger, ordered
/// by `(timestamp, id)`. The plan is all or nothing: if the batches run
/// out first, no plan is produced.
pub fn plan_distribution(total: i64, batches: &[LedgerEntry]) -> Result<DistributionPlan, Shortfall> {
    let mut spent: Vec<PayerSpend> = Vec::new();

    let (updates, unmet) = consume_oldest_first(total, batches, |batch, taken| {
        match spent.iter_mut().find(|s| s.payer == batch.payer) {
            Some(line) => line.points += taken,
            None => spent.push(PayerSpend {
                payer: batch.payer.clone(),
                points: taken,
            }),
        }
    });

    if unmet > 0 {
        return Err(Shortfall {
            requested: total,
            available: total - unmet,
        });
    }

    Ok(DistributionPlan { updates, spent })
}
