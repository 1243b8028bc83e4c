//! Tool implementations for Pitwall.
//!
//! The only tool the strategist is offered is the race-delta simulator. The
//! same scoring function drives the loop agent's pit-lap search directly.

pub mod race_delta;

use pitwall_core::tool::ToolRegistry;
use std::sync::Arc;

pub use race_delta::{DeltaModel, RaceDeltaTool, Scorer, calculate_race_delta};

/// Create the strategist's tool registry, backed by `scorer`.
pub fn strategist_registry(scorer: Arc<dyn Scorer>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(RaceDeltaTool::new(scorer)));
    registry
}

/// The registry with the built-in delta model.
pub fn default_registry() -> ToolRegistry {
    strategist_registry(Arc::new(DeltaModel))
}
