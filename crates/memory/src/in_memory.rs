//! In-memory store. Nothing survives the process.

use async_trait::async_trait;
use pitwall_core::error::MemoryError;
use pitwall_core::store::StrategyStore;
use pitwall_core::strategy::{NewStrategy, StrategyRecord};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    records: Vec<StrategyRecord>,
    last_id: i64,
}

/// Keeps records in a Vec in insertion order. Ids are never reused, matching
/// SQLite's `AUTOINCREMENT`.
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn newest_first(records: &[StrategyRecord]) -> Vec<StrategyRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
    sorted
}

#[async_trait]
impl StrategyStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn insert(&self, strategy: NewStrategy) -> Result<i64, MemoryError> {
        let mut inner = self.inner.write().await;
        inner.last_id += 1;
        let id = inner.last_id;
        inner.records.push(StrategyRecord::from_new(id, strategy));
        Ok(id)
    }

    async fn list(&self) -> Result<Vec<StrategyRecord>, MemoryError> {
        Ok(newest_first(&self.inner.read().await.records))
    }

    async fn recent(&self, limit: usize) -> Result<Vec<StrategyRecord>, MemoryError> {
        let mut records = newest_first(&self.inner.read().await.records);
        records.truncate(limit);
        Ok(records)
    }

    async fn delete(&self, id: i64) -> Result<u64, MemoryError> {
        let mut inner = self.inner.write().await;
        let before = inner.records.len();
        inner.records.retain(|r| r.id != id);
        Ok((before - inner.records.len()) as u64)
    }

    async fn count(&self) -> Result<usize, MemoryError> {
        Ok(self.inner.read().await.records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use pitwall_core::strategy::StrategyDetails;

    fn strategy(topic: &str, minutes_ago: i64) -> NewStrategy {
        NewStrategy {
            created_at: Utc::now() - Duration::minutes(minutes_ago),
            topic: topic.into(),
            details: StrategyDetails {
                strategy_name: "Undercut".into(),
                pit_lap: 22,
                tire_type: "Medium".into(),
                calculated_delta: 3.44,
                advice: None,
            },
        }
    }

    #[tokio::test]
    async fn insert_assigns_increasing_ids() {
        let store = InMemoryStore::new();
        let a = store.insert(strategy("a", 0)).await.unwrap();
        let b = store.insert(strategy("b", 0)).await.unwrap();
        assert!(b > a);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let store = InMemoryStore::new();
        store.insert(strategy("oldest", 30)).await.unwrap();
        store.insert(strategy("newest", 0)).await.unwrap();
        store.insert(strategy("middle", 10)).await.unwrap();

        let topics: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.topic)
            .collect();
        assert_eq!(topics, vec!["newest", "middle", "oldest"]);
    }

    #[tokio::test]
    async fn recent_truncates() {
        let store = InMemoryStore::new();
        for i in 0..5 {
            store.insert(strategy(&format!("t{i}"), 10 - i)).await.unwrap();
        }
        let recent = store.recent(3).await.unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].topic, "t4");
    }

    #[tokio::test]
    async fn delete_reports_rows_removed() {
        let store = InMemoryStore::new();
        let id = store.insert(strategy("gone", 0)).await.unwrap();
        assert_eq!(store.delete(id).await.unwrap(), 1);
        assert_eq!(store.delete(id).await.unwrap(), 0);
        assert_eq!(store.delete(9999).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let store = InMemoryStore::new();
        let first = store.insert(strategy("a", 0)).await.unwrap();
        store.delete(first).await.unwrap();
        let second = store.insert(strategy("b", 0)).await.unwrap();
        assert_ne!(first, second);
    }
}
