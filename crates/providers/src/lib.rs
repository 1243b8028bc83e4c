//! Language model providers for Pitwall.
//!
//! All providers implement `pitwall_core::Provider`. The router builds them
//! from configuration.

pub mod openai_compat;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use router::{ProviderRouter, build_from_config, resolve_model};
