//! Pitwall CLI, the main entry point.
//!
//! Commands:
//! - `chat`      Interactive strategy prompt (the default)
//! - `history`   Print saved strategies, newest first
//! - `delete`    Remove one saved strategy
//! - `optimize`  Run the pit-lap optimizer once and save the result
//! - `init`      Write a default config file

use clap::{Parser, Subcommand};
use pitwall_config::AppConfig;
use std::path::PathBuf;

mod commands;
mod console;
mod logging;
mod output;
mod setup;

#[derive(Parser)]
#[command(
    name = "pitwall",
    about = "Pitwall: pit-stop strategy assistant for Formula 1 races",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of ~/.pitwall/config.toml
    #[arg(long, global = true, env = "PITWALL_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite history file, overriding the config
    #[arg(long, global = true)]
    database: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask strategy questions interactively
    Chat,

    /// Show the saved strategies
    History,

    /// Delete a saved strategy by ID
    Delete {
        /// ID as shown by `pitwall history`
        id: i64,
    },

    /// Find the best pit lap over the configured range
    Optimize,

    /// Write a default config file
    Init,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())
        .map_err(|e| format!("Failed to load config: {e}"))?;
    if let Some(database) = &cli.database {
        config.memory.path = Some(database.display().to_string());
    }

    let _log_guard = logging::init(cli.verbose, &config.logging);

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => commands::chat::run(&config).await?,
        Commands::History => commands::history::run(&config).await?,
        Commands::Delete { id } => commands::delete::run(&config, id).await?,
        Commands::Optimize => commands::optimize::run(&config).await?,
        Commands::Init => commands::init::run(cli.config.as_deref())?,
    }

    Ok(())
}
