//! Strategy records and optimization results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The persisted part of a strategist or optimizer run.
///
/// This is the envelope payload handed to the memory agent; the topic and
/// timestamp are added at persistence time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyDetails {
    pub strategy_name: String,
    pub pit_lap: i64,
    pub tire_type: String,
    pub calculated_delta: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advice: Option<String>,
}

/// A strategy ready to be inserted; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStrategy {
    pub created_at: DateTime<Utc>,
    /// The full original user input.
    pub topic: String,
    pub details: StrategyDetails,
}

/// A stored strategy. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRecord {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub topic: String,
    pub strategy_name: String,
    pub pit_lap: i64,
    pub tire_type: String,
    pub calculated_delta: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advice: Option<String>,
}

impl StrategyRecord {
    pub fn from_new(id: i64, new: NewStrategy) -> Self {
        let NewStrategy {
            created_at,
            topic,
            details,
        } = new;
        Self {
            id,
            created_at,
            topic,
            strategy_name: details.strategy_name,
            pit_lap: details.pit_lap,
            tire_type: details.tire_type,
            calculated_delta: details.calculated_delta,
            advice: details.advice,
        }
    }

    /// Records whose topic mentions "optimization" are summarized as
    /// optimization runs in the strategist's context digest.
    pub fn is_optimization_run(&self) -> bool {
        self.topic.to_lowercase().contains("optimization")
    }
}

/// How a single lap fared during an optimization search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LapOutcome {
    Scored { delta: f64 },
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapEvaluation {
    pub lap: u32,
    #[serde(flatten)]
    pub outcome: LapOutcome,
}

/// What the loop agent found.
///
/// When every lap failed, `best_lap` is 0 and `best_delta` is negative
/// infinity; see [`OptimizationResult::is_degenerate`].
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationResult {
    pub strategy_name: String,
    pub tire_type: String,
    pub best_lap: u32,
    pub best_delta: f64,
    pub advice: String,
    pub evaluations: Vec<LapEvaluation>,
}

impl OptimizationResult {
    /// No lap in the range could be scored.
    pub fn is_degenerate(&self) -> bool {
        !self
            .evaluations
            .iter()
            .any(|e| matches!(e.outcome, LapOutcome::Scored { .. }))
    }

    pub fn skipped_laps(&self) -> Vec<u32> {
        self.evaluations
            .iter()
            .filter(|e| matches!(e.outcome, LapOutcome::Skipped { .. }))
            .map(|e| e.lap)
            .collect()
    }

    /// The payload persisted for this run.
    pub fn to_details(&self) -> StrategyDetails {
        StrategyDetails {
            strategy_name: self.strategy_name.clone(),
            pit_lap: i64::from(self.best_lap),
            tire_type: self.tire_type.clone(),
            calculated_delta: self.best_delta,
            advice: Some(self.advice.clone()),
        }
    }
}
