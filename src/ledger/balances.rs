//! Per-payer balance aggregation.

use std::collections::BTreeMap;

use super::LedgerEntry;

/// Net points per payer.
pub type Balances = BTreeMap<String, i64>;

/// A payer whose summed `remaining` does not fit in an `i64`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceOverflow {
    pub payer: String,
}

/// Sum `remaining` per payer over entries that carry one.
///
/// Entries with `remaining == None` contribute nothing, so a payer whose
/// entries are all fully matched spends does not appear at all.
pub fn aggregate_balances<'a, I>(entries: I) -> Result<Balances, BalanceOverflow>
where
    I: IntoIterator<Item = &'a LedgerEntry>,
{
    let mut balances = Balances::new();
    for entry in entries {
        if let Some(remaining) = entry.remaining {
            let balance = balances.entry(entry.payer.clone()).or_insert(0);
            *balance = balance.checked_add(remaining).ok_or_else(|| BalanceOverflow {
                payer: entry.payer.clone(),
            })?;
        }
    }
    Ok(balances)
}
