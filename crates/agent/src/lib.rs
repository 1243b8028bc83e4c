//! Agents behind the Pitwall prompt.
//!
//! Every line the user types goes through the [`Dispatcher`]:
//!
//! 1. The [`IntentAgent`] labels the input.
//! 2. The dispatcher routes on the label, with plain-text fallbacks.
//! 3. Strategy questions go to the [`SimulationAgent`], which lets the model
//!    call the race-delta simulator before answering.
//! 4. Optimization requests go to the [`LoopAgent`], which sweeps pit laps
//!    itself and only asks the model to explain the winner.
//! 5. Successful runs are handed to the [`MemoryAgent`] as envelopes and
//!    stored.

pub mod dispatcher;
pub mod intent_agent;
pub mod loop_agent;
pub mod memory_agent;
pub mod render;
pub mod simulation_agent;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use dispatcher::{DispatchOutcome, Dispatcher, SaveStatus};
pub use intent_agent::IntentAgent;
pub use loop_agent::LoopAgent;
pub use memory_agent::MemoryAgent;
pub use simulation_agent::{SimulationAgent, SimulationReport};
