//! SQLite LedgerStore implementation.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use sea_query::{Expr, Order, Query, SqliteQueryBuilder};
use sea_query_binder::SqlxBinder;
use sqlx::sqlite::{SqliteConnection, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::debug;

use crate::config::SqliteConfig;
use crate::ledger::{EntryId, LedgerBatch, LedgerEntry, NewEntry, RemainingUpdate};
use crate::storage::schema::{Entries, CREATE_ENTRIES_PAYER_INDEX, CREATE_ENTRIES_TABLE};
use crate::storage::{EntryFilter, LedgerStore, RemainingFilter, Result, StorageError};

/// Path value selecting a private in-memory database.
pub const MEMORY_PATH: &str = ":memory:";

/// SQLite implementation of LedgerStore.
pub struct SqliteLedgerStore {
    pool: SqlitePool,
}

impl SqliteLedgerStore {
    /// Create a new SQLite ledger store on an existing pool.
    ///
    /// Call [`init`](Self::init) before use if the schema may be missing.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect according to `config` and make sure the schema exists.
    pub async fn open(config: &SqliteConfig) -> Result<Self> {
        let pool = if config.path == MEMORY_PATH {
            // An in-memory database lives only as long as its one connection.
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
                .connect("sqlite::memory:")
                .await?
        } else {
            if let Some(parent) = Path::new(&config.path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            SqlitePoolOptions::new()
                .max_connections(config.max_connections)
                .connect(&format!("sqlite:{}?mode=rwc", config.path))
                .await?
        };

        let store = Self::new(pool);
        store.init().await?;
        Ok(store)
    }

    /// Create the entries table and index if they do not exist.
    pub async fn init(&self) -> Result<()> {
        sqlx::query(CREATE_ENTRIES_TABLE).execute(&self.pool).await?;
        sqlx::query(CREATE_ENTRIES_PAYER_INDEX)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Get the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn insert_entry(conn: &mut SqliteConnection, entry: &NewEntry) -> Result<EntryId> {
        let (sql, values) = Query::insert()
            .into_table(Entries::Table)
            .columns([
                Entries::Payer,
                Entries::Points,
                Entries::Timestamp,
                Entries::Remaining,
            ])
            .values_panic([
                entry.payer.as_str().into(),
                entry.points.into(),
                format_timestamp(entry.timestamp)?.into(),
                entry.remaining.into(),
            ])
            .build_sqlx(SqliteQueryBuilder);

        let result = sqlx::query_with(&sql, values).execute(&mut *conn).await?;
        Ok(EntryId(result.last_insert_rowid()))
    }

    async fn set_remaining(
        conn: &mut SqliteConnection,
        id: EntryId,
        remaining: Option<i64>,
    ) -> Result<()> {
        let (sql, values) = Query::update()
            .table(Entries::Table)
            .value(Entries::Remaining, remaining)
            .and_where(Expr::col(Entries::Id).eq(id.0))
            .build_sqlx(SqliteQueryBuilder);

        let result = sqlx::query_with(&sql, values).execute(&mut *conn).await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound { id });
        }
        Ok(())
    }

    /// Compare-and-set `remaining`: only rows still holding `update.expected` change.
    async fn apply_update(conn: &mut SqliteConnection, update: &RemainingUpdate) -> Result<()> {
        let (sql, values) = Query::update()
            .table(Entries::Table)
            .value(Entries::Remaining, update.remaining)
            .and_where(Expr::col(Entries::Id).eq(update.id.0))
            .and_where(Expr::col(Entries::Remaining).is(update.expected))
            .build_sqlx(SqliteQueryBuilder);

        let result = sqlx::query_with(&sql, values).execute(&mut *conn).await?;
        if result.rows_affected() == 0 {
            if Self::entry_exists(conn, update.id).await? {
                return Err(StorageError::Conflict { id: update.id });
            }
            return Err(StorageError::NotFound { id: update.id });
        }
        Ok(())
    }

    async fn entry_exists(conn: &mut SqliteConnection, id: EntryId) -> Result<bool> {
        let (sql, values) = Query::select()
            .column(Entries::Id)
            .from(Entries::Table)
            .and_where(Expr::col(Entries::Id).eq(id.0))
            .build_sqlx(SqliteQueryBuilder);

        let row = sqlx::query_with(&sql, values)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.is_some())
    }

    /// Apply a batch within an already-started transaction.
    async fn apply_batch(conn: &mut SqliteConnection, batch: LedgerBatch) -> Result<Vec<EntryId>> {
        for update in &batch.updates {
            Self::apply_update(conn, update).await?;
        }

        let mut ids = Vec::with_capacity(batch.inserts.len());
        for entry in &batch.inserts {
            ids.push(Self::insert_entry(conn, entry).await?);
        }
        Ok(ids)
    }
}

#[async_trait]
impl LedgerStore for SqliteLedgerStore {
    async fn insert(&self, entry: NewEntry) -> Result<EntryId> {
        let mut conn = self.pool.acquire().await?;
        Self::insert_entry(&mut conn, &entry).await
    }

    async fn update_remaining(&self, id: EntryId, remaining: Option<i64>) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        Self::set_remaining(&mut conn, id, remaining).await
    }

    async fn query(&self, filter: &EntryFilter) -> Result<Vec<LedgerEntry>> {
        let mut stmt = Query::select();
        stmt.columns([
            Entries::Id,
            Entries::Payer,
            Entries::Points,
            Entries::Timestamp,
            Entries::Remaining,
        ])
        .from(Entries::Table);

        if let Some(payer) = &filter.payer {
            stmt.and_where(Expr::col(Entries::Payer).eq(payer.as_str()));
        }
        match filter.remaining {
            RemainingFilter::Any => {}
            RemainingFilter::Positive => {
                stmt.and_where(Expr::col(Entries::Remaining).gt(0));
            }
            RemainingFilter::Negative => {
                stmt.and_where(Expr::col(Entries::Remaining).lt(0));
            }
            RemainingFilter::NotNull => {
                stmt.and_where(Expr::col(Entries::Remaining).is_not_null());
            }
        }
        if let Some(from) = filter.from {
            stmt.and_where(Expr::col(Entries::Timestamp).gte(format_timestamp(from)?));
        }
        if let Some(until) = filter.until {
            stmt.and_where(Expr::col(Entries::Timestamp).lte(format_timestamp(until)?));
        }
        stmt.order_by(Entries::Timestamp, Order::Asc)
            .order_by(Entries::Id, Order::Asc);

        let (sql, values) = stmt.build_sqlx(SqliteQueryBuilder);
        let rows = sqlx::query_with(&sql, values).fetch_all(&self.pool).await?;

        rows.iter().map(entry_from_row).collect()
    }

    async fn commit(&self, batch: LedgerBatch) -> Result<Vec<EntryId>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            updates = batch.updates.len(),
            inserts = batch.inserts.len(),
            "Committing ledger batch"
        );

        // BEGIN IMMEDIATE acquires the write lock upfront, preventing deadlocks
        // when concurrent DEFERRED transactions race to upgrade from shared to exclusive.
        let mut conn = self.pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

        let result = Self::apply_batch(&mut conn, batch).await;

        match result {
            Ok(ids) => {
                sqlx::query("COMMIT").execute(&mut *conn).await?;
                Ok(ids)
            }
            Err(e) => {
                let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
                Err(e)
            }
        }
    }
}

/// Fixed-width RFC 3339 in UTC so text comparison matches time order.
///
/// Only four-digit years render at a fixed width; anything else is rejected.
fn format_timestamp(ts: DateTime<Utc>) -> Result<String> {
    if !(0..=9999).contains(&ts.year()) {
        return Err(StorageError::InvalidTimestamp(format!(
            "year {} outside 0000-9999",
            ts.year()
        )));
    }
    Ok(ts.to_rfc3339_opts(SecondsFormat::Nanos, true))
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::InvalidTimestamp(format!("{}: {}", raw, e)))
}

fn entry_from_row(row: &SqliteRow) -> Result<LedgerEntry> {
    let timestamp: String = row.try_get("timestamp")?;
    Ok(LedgerEntry {
        id: EntryId(row.try_get("id")?),
        payer: row.try_get("payer")?,
        points: row.try_get("points")?,
        timestamp: parse_timestamp(&timestamp)?,
        remaining: row.try_get("remaining")?,
    })
}
