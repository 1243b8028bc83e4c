//! `pitwall history`: print the saved strategies.

use crate::setup;
use pitwall_agent::render::history_table;
use pitwall_config::AppConfig;

pub async fn run(config: &AppConfig) -> pitwall_core::Result<()> {
    let store = setup::open_store(config).await?;
    let records = store.list().await?;
    println!("{}", history_table(&records));
    Ok(())
}
