//! Wiring shared by the subcommands: store, provider, dispatcher.

use pitwall_agent::Dispatcher;
use pitwall_config::AppConfig;
use pitwall_core::error::MemoryError;
use pitwall_core::provider::Provider;
use pitwall_core::store::StrategyStore;
use pitwall_core::{Error, Result};
use pitwall_memory::{InMemoryStore, SqliteStrategyStore};
use std::sync::Arc;
use tracing::info;

/// Open the configured strategy store, creating the database directory if
/// needed.
pub async fn open_store(config: &AppConfig) -> Result<Arc<dyn StrategyStore>> {
    if config.memory.backend == "in_memory" {
        info!("Using in-memory strategy store; history will not survive exit");
        return Ok(Arc::new(InMemoryStore::new()));
    }

    let path = config.database_path();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| MemoryError::Storage(format!("Cannot create {}: {e}", parent.display())))?;
    }

    let store = SqliteStrategyStore::new(&path.to_string_lossy()).await?;
    Ok(Arc::new(store))
}

/// Whether a key is available for the default provider, from the top level
/// or its own table.
pub fn has_credentials(config: &AppConfig) -> bool {
    config.has_api_key()
        || config
            .providers
            .get(&config.default_provider)
            .is_some_and(|p| p.api_key.is_some())
}

/// Fail before any prompt is shown if no key is configured.
pub fn require_api_key(config: &AppConfig) -> Result<()> {
    if has_credentials(config) {
        return Ok(());
    }

    eprintln!();
    eprintln!("  ERROR: No API key configured!");
    eprintln!();
    eprintln!("  Set one of these environment variables (or put it in a .env file):");
    eprintln!("    PITWALL_API_KEY     generic, used for any provider");
    eprintln!("    GEMINI_API_KEY      for Gemini (the default provider)");
    eprintln!("    OPENAI_API_KEY      for OpenAI");
    eprintln!("    OPENROUTER_API_KEY  for OpenRouter");
    eprintln!();
    eprintln!("  Or add `api_key` to your config file:");
    eprintln!("    {}", AppConfig::config_path().display());
    eprintln!();
    Err(Error::Config {
        message: "No API key found. See above for setup instructions.".into(),
    })
}

pub fn build_provider(config: &AppConfig) -> Result<Arc<dyn Provider>> {
    let router = pitwall_providers::build_from_config(config);
    router.default().ok_or_else(|| Error::Config {
        message: format!("No provider named '{}'", config.default_provider),
    })
}

/// Credential check, store, provider and dispatcher in one go.
pub async fn dispatcher(config: &AppConfig) -> Result<Dispatcher> {
    require_api_key(config)?;
    let store = open_store(config).await?;
    let provider = build_provider(config)?;
    let model = pitwall_providers::resolve_model(config);

    info!(
        provider = %config.default_provider,
        model = %model,
        database = %config.database_path().display(),
        "Pitwall ready"
    );
    Ok(Dispatcher::from_config(config, provider, &model, store))
}
