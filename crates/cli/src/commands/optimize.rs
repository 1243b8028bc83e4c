//! `pitwall optimize`: one optimizer run without the prompt.

use crate::output;
use crate::setup;
use pitwall_config::AppConfig;

/// Stored as the record's topic so the run is summarized as an
/// optimization in later strategist context.
const TOPIC: &str = "Pit-lap optimization run";

pub async fn run(config: &AppConfig) -> pitwall_core::Result<()> {
    let dispatcher = setup::dispatcher(config).await?;
    let outcome = dispatcher.optimize(TOPIC).await;
    if let Some(text) = output::render(&outcome) {
        println!("{text}");
    }
    Ok(())
}
