//! StrategyStore trait: durable strategy history.
//!
//! The store is the long-term memory of the assistant: an append-only list of
//! strategy records that can be listed newest-first and deleted by id.

use crate::error::MemoryError;
use crate::strategy::{NewStrategy, StrategyRecord};
use async_trait::async_trait;

/// Implementations: SQLite (default), in-memory (tests and ephemeral runs).
#[async_trait]
pub trait StrategyStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "in_memory").
    fn name(&self) -> &str;

    /// Insert a record and return its newly assigned id.
    async fn insert(&self, strategy: NewStrategy) -> Result<i64, MemoryError>;

    /// All records, newest first by timestamp.
    async fn list(&self) -> Result<Vec<StrategyRecord>, MemoryError>;

    /// The `limit` most recent records, newest first.
    async fn recent(&self, limit: usize) -> Result<Vec<StrategyRecord>, MemoryError>;

    /// Delete by id; returns the number of rows removed (0 or 1).
    async fn delete(&self, id: i64) -> Result<u64, MemoryError>;

    /// Total record count.
    async fn count(&self) -> Result<usize, MemoryError>;
}
