//! JSON-lines command handler.
//!
//! One JSON object per line in, one JSON value per line out:
//!
//! ```text
//! {"op":"record","payer":"DANNON","points":300,"timestamp":"2020-10-31T10:00:00Z"}
//! {"op":"spend","points":5000}
//! {"op":"balances"}
//! {"op":"entries"}
//! ```
//!
//! Failures are answered with `{"error": "..."}` and never end the stream.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::ledger::LedgerError;
use crate::services::PointsLedger;

/// A single request line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    Record {
        payer: String,
        points: i64,
        timestamp: DateTime<Utc>,
    },
    Spend {
        points: i64,
        /// Event time for the spend entries; the current time when absent.
        #[serde(default)]
        timestamp: Option<DateTime<Utc>>,
    },
    Balances,
    Entries,
}

/// Command handler errors.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Invalid command: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Parse one request line.
pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    Ok(serde_json::from_str(line)?)
}

/// Run a parsed command against the ledger and render its result.
pub async fn execute(ledger: &PointsLedger, command: Command) -> Result<Value, CommandError> {
    debug!(command = ?command, "Executing command");
    let value = match command {
        Command::Record {
            payer,
            points,
            timestamp,
        } => {
            let id = ledger.record_event(&payer, points, timestamp).await?;
            json!({ "id": id })
        }
        Command::Spend { points, timestamp } => {
            let spent = match timestamp {
                Some(ts) => ledger.spend_at(points, ts).await?,
                None => ledger.spend(points).await?,
            };
            json!(spent)
        }
        Command::Balances => json!(ledger.balances().await?),
        Command::Entries => json!(ledger.entries().await?),
    };
    Ok(value)
}

/// Handle one raw line, folding any failure into an error response.
pub async fn handle_line(ledger: &PointsLedger, line: &str) -> Value {
    let result = match parse_command(line) {
        Ok(command) => execute(ledger, command).await,
        Err(e) => Err(e),
    };
    result.unwrap_or_else(|e| json!({ "error": e.to_string() }))
}
