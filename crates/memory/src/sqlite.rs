//! SQLite strategy store.
//!
//! One table, `strategies`, created on open. Timestamps are stored as
//! RFC 3339 text with microsecond precision in UTC, so lexical order is
//! chronological order.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use pitwall_core::error::MemoryError;
use pitwall_core::store::StrategyStore;
use pitwall_core::strategy::{NewStrategy, StrategyRecord};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

const SELECT_COLUMNS: &str = "SELECT id, timestamp, topic, strategy_name, pit_lap, tire_type, \
                              calculated_delta, advice FROM strategies";

pub struct SqliteStrategyStore {
    pool: SqlitePool,
}

impl SqliteStrategyStore {
    /// Open (or create) the database at `path` and run migrations.
    ///
    /// Accepts a plain file path or a `sqlite:` URL. `"sqlite::memory:"` gives
    /// a private in-process database.
    pub async fn new(path: &str) -> Result<Self, MemoryError> {
        let in_memory = path.contains(":memory:");
        let options = if in_memory || path.starts_with("sqlite:") {
            SqliteConnectOptions::from_str(path)
                .map_err(|e| MemoryError::Storage(format!("Invalid SQLite path: {e}")))?
        } else {
            SqliteConnectOptions::new().filename(path)
        }
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal);

        // Every connection to :memory: is a separate database.
        let max_connections = if in_memory { 1 } else { 4 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| MemoryError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite strategy store initialized at {path}");
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), MemoryError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS strategies (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp        TEXT NOT NULL,
                topic            TEXT NOT NULL,
                strategy_name    TEXT NOT NULL,
                pit_lap          INTEGER NOT NULL,
                tire_type        TEXT NOT NULL,
                calculated_delta REAL NOT NULL,
                advice           TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("strategies table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_strategies_timestamp ON strategies(timestamp DESC)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("timestamp index: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<StrategyRecord, MemoryError> {
        let column = |name: &str, e: sqlx::Error| MemoryError::QueryFailed(format!("{name} column: {e}"));

        let timestamp: String = row.try_get("timestamp").map_err(|e| column("timestamp", e))?;
        let created_at = DateTime::parse_from_rfc3339(&timestamp)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| MemoryError::QueryFailed(format!("bad timestamp '{timestamp}': {e}")))?;

        Ok(StrategyRecord {
            id: row.try_get("id").map_err(|e| column("id", e))?,
            created_at,
            topic: row.try_get("topic").map_err(|e| column("topic", e))?,
            strategy_name: row
                .try_get("strategy_name")
                .map_err(|e| column("strategy_name", e))?,
            pit_lap: row.try_get("pit_lap").map_err(|e| column("pit_lap", e))?,
            tire_type: row.try_get("tire_type").map_err(|e| column("tire_type", e))?,
            calculated_delta: row
                .try_get("calculated_delta")
                .map_err(|e| column("calculated_delta", e))?,
            advice: row.try_get("advice").map_err(|e| column("advice", e))?,
        })
    }
}

#[async_trait]
impl StrategyStore for SqliteStrategyStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn insert(&self, strategy: NewStrategy) -> Result<i64, MemoryError> {
        let timestamp = strategy
            .created_at
            .to_rfc3339_opts(SecondsFormat::Micros, true);
        let details = &strategy.details;

        let result = sqlx::query(
            r#"
            INSERT INTO strategies
                (timestamp, topic, strategy_name, pit_lap, tire_type, calculated_delta, advice)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&timestamp)
        .bind(&strategy.topic)
        .bind(&details.strategy_name)
        .bind(details.pit_lap)
        .bind(&details.tire_type)
        .bind(details.calculated_delta)
        .bind(details.advice.as_deref())
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::Storage(format!("INSERT failed: {e}")))?;

        let id = result.last_insert_rowid();
        debug!(id, strategy_name = %details.strategy_name, "Stored strategy");
        Ok(id)
    }

    async fn list(&self) -> Result<Vec<StrategyRecord>, MemoryError> {
        let sql = format!("{SELECT_COLUMNS} ORDER BY timestamp DESC, id DESC");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| MemoryError::QueryFailed(format!("LIST: {e}")))?;

        rows.iter().map(Self::row_to_record).collect()
    }

    async fn recent(&self, limit: usize) -> Result<Vec<StrategyRecord>, MemoryError> {
        let sql = format!("{SELECT_COLUMNS} ORDER BY timestamp DESC, id DESC LIMIT ?1");
        let rows = sqlx::query(&sql)
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| MemoryError::QueryFailed(format!("RECENT: {e}")))?;

        rows.iter().map(Self::row_to_record).collect()
    }

    async fn delete(&self, id: i64) -> Result<u64, MemoryError> {
        let result = sqlx::query("DELETE FROM strategies WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| MemoryError::Storage(format!("DELETE failed: {e}")))?;

        Ok(result.rows_affected())
    }

    async fn count(&self) -> Result<usize, MemoryError> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM strategies")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| MemoryError::QueryFailed(format!("COUNT: {e}")))?;

        let cnt: i64 = row
            .try_get("cnt")
            .map_err(|e| MemoryError::QueryFailed(format!("cnt column: {e}")))?;

        Ok(usize::try_from(cnt).unwrap_or_default())
    }
}
