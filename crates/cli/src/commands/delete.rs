//! `pitwall delete <id>`: remove one saved strategy.

use crate::output;
use crate::setup;
use pitwall_config::AppConfig;

pub async fn run(config: &AppConfig, id: i64) -> pitwall_core::Result<()> {
    let store = setup::open_store(config).await?;
    match store.delete(id).await? {
        0 => println!("{}", output::not_found(id)),
        _ => println!("{}", output::deleted(id)),
    }
    Ok(())
}
