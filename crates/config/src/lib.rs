//! Configuration loading, validation, and management for Pitwall.
//!
//! Loads configuration from `~/.pitwall/config.toml` (or an explicit path)
//! with environment variable overrides. Validates all settings at startup.

use pitwall_core::TireCompound;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Environment variables checked for an API key, highest priority first.
pub const API_KEY_VARS: [&str; 4] = [
    "PITWALL_API_KEY",
    "GEMINI_API_KEY",
    "OPENAI_API_KEY",
    "OPENROUTER_API_KEY",
];

/// The root configuration structure.
///
/// Maps directly to `~/.pitwall/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Strategy history storage
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Pit-lap search settings
    #[serde(default)]
    pub optimizer: OptimizerConfig,

    /// Strategist behaviour
    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_provider() -> String {
    "gemini".into()
}
fn default_model() -> String {
    "gemini-2.5-flash".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    2048
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("providers", &self.providers)
            .field("memory", &self.memory)
            .field("optimizer", &self.optimizer)
            .field("agent", &self.agent)
            .field("logging", &self.logging)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// "sqlite" or "in_memory"
    #[serde(default = "default_memory_backend")]
    pub backend: String,

    /// SQLite file; defaults to `~/.pitwall/f1_strategies.db`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

fn default_memory_backend() -> String {
    "sqlite".into()
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            backend: default_memory_backend(),
            path: None,
        }
    }
}

/// The fixed search space of the loop agent. Never derived from user input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerConfig {
    #[serde(default = "default_start_lap")]
    pub start_lap: u32,

    /// Inclusive
    #[serde(default = "default_end_lap")]
    pub end_lap: u32,

    #[serde(default = "default_tire_type")]
    pub tire_type: String,

    #[serde(default = "default_strategy_name")]
    pub strategy_name: String,
}

fn default_start_lap() -> u32 {
    15
}
fn default_end_lap() -> u32 {
    30
}
fn default_tire_type() -> String {
    "Medium".into()
}
fn default_strategy_name() -> String {
    "Optimization Check".into()
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            start_lap: default_start_lap(),
            end_lap: default_end_lap(),
            tire_type: default_tire_type(),
            strategy_name: default_strategy_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Upper bound on simulate-and-reply rounds per strategist turn
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: u32,

    /// How many recent records are summarized for the strategist
    #[serde(default = "default_history_context_limit")]
    pub history_context_limit: usize,

    /// Temperature for the intent classifier
    #[serde(default)]
    pub classifier_temperature: f32,
}

fn default_max_tool_rounds() -> u32 {
    5
}
fn default_history_context_limit() -> usize {
    3
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: default_max_tool_rounds(),
            history_context_limit: default_history_context_limit(),
            classifier_temperature: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from `path`, or the default location, then apply
    /// environment overrides from the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::config_path);
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    ///
    /// - API key: first of [`API_KEY_VARS`], only if the file set none
    /// - `PITWALL_PROVIDER`, `PITWALL_MODEL`, `PITWALL_DATABASE`
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = API_KEY_VARS
                .iter()
                .find_map(|var| lookup(var).filter(|v| !v.trim().is_empty()));
        }
        if let Some(provider) = lookup("PITWALL_PROVIDER") {
            self.default_provider = provider;
        }
        if let Some(model) = lookup("PITWALL_MODEL") {
            self.default_model = model;
        }
        if let Some(db) = lookup("PITWALL_DATABASE") {
            self.memory.path = Some(db);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".pitwall")
    }

    /// Default config file location.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Where the SQLite history lives.
    pub fn database_path(&self) -> PathBuf {
        self.memory
            .path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| Self::config_dir().join("f1_strategies.db"))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if !matches!(self.memory.backend.as_str(), "sqlite" | "in_memory") {
            return Err(ConfigError::ValidationError(format!(
                "memory.backend must be \"sqlite\" or \"in_memory\", got \"{}\"",
                self.memory.backend
            )));
        }

        let opt = &self.optimizer;
        if opt.start_lap == 0 {
            return Err(ConfigError::ValidationError(
                "optimizer.start_lap must be at least 1".into(),
            ));
        }
        if opt.start_lap > opt.end_lap {
            return Err(ConfigError::ValidationError(format!(
                "optimizer.start_lap ({}) must not exceed optimizer.end_lap ({})",
                opt.start_lap, opt.end_lap
            )));
        }
        if let Err(e) = opt.tire_type.parse::<TireCompound>() {
            return Err(ConfigError::ValidationError(format!("optimizer.tire_type: {e}")));
        }
        if opt.strategy_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "optimizer.strategy_name must not be empty".into(),
            ));
        }

        if self.agent.max_tool_rounds == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_tool_rounds must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for the `init` command).
    pub fn default_toml() -> Result<String, ConfigError> {
        toml::to_string_pretty(&Self::default())
            .map_err(|e| ConfigError::ValidationError(format!("serializing defaults: {e}")))
    }

    /// Write the default config to `path`, refusing to overwrite.
    pub fn write_default(path: &Path) -> Result<(), ConfigError> {
        if path.exists() {
            return Err(ConfigError::WriteError {
                path: path.to_path_buf(),
                reason: "file already exists".into(),
            });
        }
        let write_err = |e: std::io::Error| ConfigError::WriteError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(path, Self::default_toml()?).map_err(write_err)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            providers: HashMap::new(),
            memory: MemoryConfig::default(),
            optimizer: OptimizerConfig::default(),
            agent: AgentConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Failed to write config file at {path}: {reason}")]
    WriteError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_provider, "gemini");
        assert_eq!(config.optimizer.start_lap, 15);
        assert_eq!(config.optimizer.end_lap, 30);
        assert_eq!(config.optimizer.tire_type, "Medium");
        assert_eq!(config.optimizer.strategy_name, "Optimization Check");
        assert_eq!(config.agent.history_context_limit, 3);
    }

    #[test]
    fn config_roundtrip_toml() {
        let toml_str = AppConfig::default_toml().unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_model, "gemini-2.5-flash");
        assert_eq!(parsed.optimizer.end_lap, 30);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            default_temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn inverted_lap_range_rejected() {
        let mut config = AppConfig::default();
        config.optimizer.start_lap = 31;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("start_lap"));
    }

    #[test]
    fn unknown_tire_rejected() {
        let mut config = AppConfig::default();
        config.optimizer.tire_type = "Slick".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.default_provider, "gemini");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_model = "gpt-4o-mini"

[optimizer]
start_lap = 10
end_lap = 20
tire_type = "hard"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.default_model, "gpt-4o-mini");
        assert_eq!(config.optimizer.start_lap, 10);
        assert_eq!(config.optimizer.strategy_name, "Optimization Check");
        assert_eq!(config.memory.backend, "sqlite");
    }

    #[test]
    fn unparseable_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "default_model = [").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn env_overrides_fill_api_key_in_priority_order() {
        let mut config = AppConfig::default();
        config.apply_env_overrides(|key| match key {
            "GEMINI_API_KEY" => Some("gem-key".into()),
            "OPENAI_API_KEY" => Some("oa-key".into()),
            "PITWALL_DATABASE" => Some("/tmp/x.db".into()),
            _ => None,
        });
        assert_eq!(config.api_key.as_deref(), Some("gem-key"));
        assert_eq!(config.database_path(), PathBuf::from("/tmp/x.db"));
    }

    #[test]
    fn file_api_key_wins_over_env() {
        let mut config = AppConfig {
            api_key: Some("from-file".into()),
            ..AppConfig::default()
        };
        config.apply_env_overrides(|_| Some("from-env".into()));
        assert_eq!(config.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let config = AppConfig {
            api_key: Some("super-secret".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn write_default_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        AppConfig::write_default(&path).unwrap();
        assert!(AppConfig::load_from(&path).is_ok());
        assert!(matches!(
            AppConfig::write_default(&path),
            Err(ConfigError::WriteError { .. })
        ));
    }
}
