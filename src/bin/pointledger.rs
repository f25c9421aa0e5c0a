//! pointledger: JSON-lines front end for the points ledger
//!
//! Reads one command per line on stdin and writes one JSON response per line
//! on stdout. Logs go to stderr.
//!
//! ## Configuration
//! - POINTLEDGER_CONFIG: Path to a YAML config file (optional)
//! - POINTLEDGER__STORAGE__TYPE: `memory` or `sqlite` (default: sqlite)
//! - POINTLEDGER__STORAGE__SQLITE__PATH: Database file (default: data/pointledger.db)
//! - POINTLEDGER__LEDGER__SPEND_HORIZON: `event_time` or `unbounded`
//! - POINTLEDGER_LOG: tracing filter (default: info)

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};

use pointledger::config::Config;
use pointledger::handlers::commands::handle_line;
use pointledger::services::PointsLedger;
use pointledger::storage::init_storage;
use pointledger::utils::bootstrap::init_tracing;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = Config::load(None).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    let store = init_storage(&config.storage).await?;
    let ledger = PointsLedger::with_config(store, config.ledger);

    info!(storage = ?config.storage.storage_type, "pointledger started");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = handle_line(&ledger, &line).await;
        stdout.write_all(response.to_string().as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    info!("pointledger input closed");
    Ok(())
}
