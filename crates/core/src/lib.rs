//! # Pitwall Core
//!
//! Domain types, traits, and error definitions for the Pitwall race strategy
//! assistant. This crate has **no I/O dependencies**: it defines the domain
//! model that every other crate implements against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is a trait here. Implementations live in their
//! respective crates:
//! - [`Provider`]: the language model (`pitwall-providers`)
//! - [`Classifier`]: intent classification (`pitwall-agent`)
//! - [`Tool`]: callable functions offered to the model (`pitwall-tools`)
//! - [`StrategyStore`]: durable strategy history (`pitwall-memory`)
//!
//! This keeps the dispatcher testable with scripted fakes.

pub mod envelope;
pub mod error;
pub mod intent;
pub mod message;
pub mod provider;
pub mod store;
pub mod strategy;
pub mod tire;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use envelope::{Envelope, EnvelopeBuilder, EnvelopeStatus};
pub use error::{Error, Result};
pub use intent::{ClassificationResult, Classifier, Intent};
pub use message::{Message, MessageToolCall, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ResponseFormat, ToolDefinition};
pub use store::StrategyStore;
pub use strategy::{
    LapEvaluation, LapOutcome, NewStrategy, OptimizationResult, StrategyDetails, StrategyRecord,
};
pub use tire::TireCompound;
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult};
