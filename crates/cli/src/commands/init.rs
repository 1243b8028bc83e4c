//! `pitwall init`: write a default config file.

use pitwall_config::AppConfig;
use std::path::Path;

pub fn run(path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::config_path);

    if config_path.exists() {
        println!("Config already exists at: {}", config_path.display());
        println!("Edit it manually, or delete it and re-run `pitwall init`.");
        return Ok(());
    }

    AppConfig::write_default(&config_path)?;
    println!("Created {}", config_path.display());
    println!();
    println!("Next steps:");
    println!("  1. Set GEMINI_API_KEY (or add api_key to the file)");
    println!("  2. Run: pitwall");
    Ok(())
}
