//! Memory agent: turns a successful envelope into a stored strategy.

use chrono::Utc;
use pitwall_core::envelope::Envelope;
use pitwall_core::error::MemoryError;
use pitwall_core::store::StrategyStore;
use pitwall_core::strategy::{NewStrategy, StrategyDetails};
use std::sync::Arc;
use tracing::info;

pub struct MemoryAgent {
    store: Arc<dyn StrategyStore>,
}

impl MemoryAgent {
    pub fn new(store: Arc<dyn StrategyStore>) -> Self {
        Self { store }
    }

    /// Persist the envelope's payload and return the new record id.
    ///
    /// The topic is the envelope's original user input. Failed envelopes,
    /// missing payloads, payloads that are not a strategy, and non-finite
    /// deltas are rejected without touching the store.
    pub async fn persist(&self, envelope: &Envelope) -> Result<i64, MemoryError> {
        if !envelope.is_success() {
            return Err(MemoryError::Rejected(format!(
                "{} sent a {} envelope",
                envelope.sender_agent(),
                envelope.status()
            )));
        }

        let details: StrategyDetails = envelope
            .payload_as()
            .ok_or_else(|| MemoryError::Rejected("envelope has no payload".into()))?
            .map_err(|e| MemoryError::Rejected(format!("payload is not a strategy: {e}")))?;

        if !details.calculated_delta.is_finite() {
            return Err(MemoryError::Rejected(format!(
                "delta {} cannot be stored",
                details.calculated_delta
            )));
        }

        let id = self
            .store
            .insert(NewStrategy {
                created_at: Utc::now(),
                topic: envelope.user_input().to_string(),
                details,
            })
            .await?;

        info!(
            id,
            sender = envelope.sender_agent(),
            target = envelope.target_intent(),
            "Strategy saved"
        );
        Ok(id)
    }
}
