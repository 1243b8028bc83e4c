//! Strategy history storage for Pitwall.
//!
//! Two [`StrategyStore`](pitwall_core::StrategyStore) implementations:
//! [`SqliteStrategyStore`] for the durable history file, and
//! [`InMemoryStore`] for tests and the `in_memory` backend.

pub mod in_memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use in_memory::InMemoryStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStrategyStore;
