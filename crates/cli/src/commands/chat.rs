//! `pitwall chat`: the interactive strategy prompt.

use crate::console::Console;
use crate::output;
use crate::setup;
use pitwall_config::AppConfig;
use tracing::debug;

pub async fn run(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let dispatcher = setup::dispatcher(config).await?;

    println!("{}", output::BANNER);

    let mut console = Console::stdin();
    loop {
        let Some(line) = console.read_line(output::PROMPT).await? else {
            println!();
            println!("{}", output::GOODBYE);
            break;
        };

        let outcome = dispatcher.handle(&line).await;
        debug!(?outcome, "Handled input");

        if let Some(text) = output::render(&outcome) {
            println!();
            println!("{text}");
        }
        if outcome.is_exit() {
            break;
        }
    }

    Ok(())
}
