//! PointsLedger interface step definitions.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use cucumber::gherkin::Step;
use cucumber::{given, then, when, World};

use pointledger::ledger::{LedgerEntry, LedgerError, PayerSpend};
use pointledger::services::PointsLedger;

use crate::backend::{LedgerContext, StorageBackend};

/// Test context for PointsLedger scenarios.
#[derive(Debug, World)]
#[world(init = Self::new)]
pub struct PointsLedgerWorld {
    backend: StorageBackend,
    context: Option<LedgerContext>,
    before_spend: Vec<LedgerEntry>,
    last_spend: Option<Vec<PayerSpend>>,
    last_error: Option<LedgerError>,
}

impl PointsLedgerWorld {
    fn new() -> Self {
        Self {
            backend: StorageBackend::from_env(),
            context: None,
            before_spend: Vec::new(),
            last_spend: None,
            last_error: None,
        }
    }

    fn ledger(&self) -> &PointsLedger {
        &self
            .context
            .as_ref()
            .expect("Ledger context not initialized")
            .ledger
    }

    async fn record(&mut self, payer: &str, points: i64, at: &str) {
        let result = self.ledger().record_event(payer, points, parse_time(at)).await;
        self.last_error = result.err();
    }

    async fn entry(&self, payer: &str, points: i64, at: &str) -> LedgerEntry {
        let timestamp = parse_time(at);
        self.ledger()
            .entries()
            .await
            .expect("Failed to list entries")
            .into_iter()
            .find(|e| e.payer == payer && e.points == points && e.timestamp == timestamp)
            .unwrap_or_else(|| panic!("No {} point entry for {} at {}", points, payer, at))
    }

    async fn balances(&self) -> BTreeMap<String, i64> {
        self.ledger()
            .balances()
            .await
            .expect("Failed to read balances")
    }
}

fn parse_time(raw: &str) -> DateTime<Utc> {
    raw.parse()
        .unwrap_or_else(|e| panic!("Bad timestamp {:?}: {}", raw, e))
}

fn table_rows(step: &Step) -> Vec<(String, i64)> {
    let table = step.table.as_ref().expect("Step requires a data table");
    table
        .rows
        .iter()
        .skip(1)
        .map(|row| {
            let points = row[1]
                .parse()
                .unwrap_or_else(|e| panic!("Bad points {:?}: {}", row[1], e));
            (row[0].clone(), points)
        })
        .collect()
}

// --- Background ---

#[given("a points ledger")]
async fn given_points_ledger(world: &mut PointsLedgerWorld) {
    println!("Using backend: {}", world.backend.name());
    world.context = Some(LedgerContext::new(world.backend).await);
}

// --- Given steps ---

#[given(expr = "{string} earns {int} points at {string}")]
async fn given_earn(world: &mut PointsLedgerWorld, payer: String, points: i64, at: String) {
    world.record(&payer, points, &at).await;
    assert!(world.last_error.is_none(), "earn failed: {:?}", world.last_error);
}

#[given(expr = "{string} spends {int} points at {string}")]
async fn given_payer_spend(world: &mut PointsLedgerWorld, payer: String, points: i64, at: String) {
    world.record(&payer, -points, &at).await;
    assert!(world.last_error.is_none(), "spend failed: {:?}", world.last_error);
}

// --- When steps ---

#[when(expr = "{string} earns {int} points at {string}")]
async fn when_earn(world: &mut PointsLedgerWorld, payer: String, points: i64, at: String) {
    world.record(&payer, points, &at).await;
}

#[when(expr = "{string} spends {int} points at {string}")]
async fn when_payer_spend(world: &mut PointsLedgerWorld, payer: String, points: i64, at: String) {
    world.record(&payer, -points, &at).await;
}

#[when(expr = "{int} points are spent at {string}")]
async fn when_spend_at(world: &mut PointsLedgerWorld, total: i64, at: String) {
    world.before_spend = world.ledger().entries().await.expect("Failed to list entries");
    match world.ledger().spend_at(total, parse_time(&at)).await {
        Ok(spent) => {
            world.last_spend = Some(spent);
            world.last_error = None;
        }
        Err(e) => {
            world.last_spend = None;
            world.last_error = Some(e);
        }
    }
}

// --- Then steps ---

#[then(expr = "the {string} entry of {int} points at {string} has {int} remaining")]
async fn then_entry_remaining(
    world: &mut PointsLedgerWorld,
    payer: String,
    points: i64,
    at: String,
    remaining: i64,
) {
    let entry = world.entry(&payer, points, &at).await;
    assert_eq!(entry.remaining, Some(remaining), "entry: {:?}", entry);
}

#[then(expr = "the {string} entry of {int} points at {string} is settled")]
async fn then_entry_settled(world: &mut PointsLedgerWorld, payer: String, points: i64, at: String) {
    let entry = world.entry(&payer, points, &at).await;
    assert_eq!(entry.remaining, None, "entry: {:?}", entry);
}

#[then(expr = "the balance of {string} is {int}")]
async fn then_balance(world: &mut PointsLedgerWorld, payer: String, expected: i64) {
    let balances = world.balances().await;
    assert_eq!(balances.get(&payer), Some(&expected), "balances: {:?}", balances);
}

#[then(expr = "{string} has no balance")]
async fn then_no_balance(world: &mut PointsLedgerWorld, payer: String) {
    let balances = world.balances().await;
    assert!(!balances.contains_key(&payer), "balances: {:?}", balances);
}

#[then("the balances are:")]
async fn then_balances_table(world: &mut PointsLedgerWorld, step: &Step) {
    let expected: BTreeMap<String, i64> = table_rows(step).into_iter().collect();
    assert_eq!(world.balances().await, expected);
}

#[then("the spend draws:")]
async fn then_spend_draws(world: &mut PointsLedgerWorld, step: &Step) {
    let expected: Vec<PayerSpend> = table_rows(step)
        .into_iter()
        .map(|(payer, points)| PayerSpend { payer, points })
        .collect();
    let spent = world
        .last_spend
        .as_ref()
        .unwrap_or_else(|| panic!("spend failed: {:?}", world.last_error));
    assert_eq!(spent, &expected);
}

#[then(expr = "the spend fails with insufficient points, {int} available")]
async fn then_spend_insufficient(world: &mut PointsLedgerWorld, expected: i64) {
    assert!(world.last_spend.is_none(), "spend should have failed");
    match &world.last_error {
        Some(LedgerError::InsufficientPoints { available, .. }) => {
            assert_eq!(*available, expected)
        }
        other => panic!("expected InsufficientPoints, got {:?}", other),
    }
}

#[then("the ledger is unchanged")]
async fn then_ledger_unchanged(world: &mut PointsLedgerWorld) {
    let entries = world.ledger().entries().await.expect("Failed to list entries");
    assert_eq!(entries, world.before_spend);
}

#[then(expr = "the operation is rejected with {string}")]
async fn then_rejected(world: &mut PointsLedgerWorld, message: String) {
    let error = world
        .last_error
        .as_ref()
        .expect("operation should have failed");
    assert!(matches!(error, LedgerError::Validation(_)), "got {:?}", error);
    assert!(
        error.to_string().contains(&message),
        "{:?} does not mention {:?}",
        error.to_string(),
        message
    );
}

#[then("no entries are stored")]
async fn then_no_entries(world: &mut PointsLedgerWorld) {
    let entries = world.ledger().entries().await.expect("Failed to list entries");
    assert!(entries.is_empty(), "entries: {:?}", entries);
}

#[then("points are conserved for every payer")]
async fn then_conserved(world: &mut PointsLedgerWorld) {
    let mut points: BTreeMap<String, i64> = BTreeMap::new();
    let mut remaining: BTreeMap<String, i64> = BTreeMap::new();
    for entry in world.ledger().entries().await.expect("Failed to list entries") {
        *points.entry(entry.payer.clone()).or_default() += entry.points;
        *remaining.entry(entry.payer).or_default() += entry.remaining.unwrap_or(0);
    }
    assert_eq!(points, remaining);
}
