//! Configuration management for askdb.
//!
//! Handles loading configuration from TOML files and environment variables.
//! Precedence, highest first: CLI flags, config file, environment, defaults.

use crate::error::{AskError, Result};
use crate::llm::LlmProvider;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for askdb.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Storage settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// LLM provider configuration.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Resolution settings shared by both resolvers.
    #[serde(default)]
    pub resolution: ResolutionConfig,

    /// Schema snapshot settings.
    #[serde(default)]
    pub schema: SchemaConfig,
}

/// SQLite storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    /// The single table questions are answered against.
    #[serde(default = "default_table")]
    pub table: String,

    /// Maximum number of pooled read-only connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Number of sample rows captured in the schema snapshot.
    #[serde(default = "default_sample_rows")]
    pub sample_rows: usize,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("companies.db")
}

fn default_table() -> String {
    "companies".to_string()
}

fn default_max_connections() -> u32 {
    4
}

fn default_sample_rows() -> usize {
    3
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            table: default_table(),
            max_connections: default_max_connections(),
            sample_rows: default_sample_rows(),
        }
    }
}

impl DatabaseConfig {
    /// Applies environment variables (ASKDB_DATABASE, ASKDB_TABLE) where the
    /// file left the defaults in place.
    pub fn apply_env_defaults(&mut self) {
        if self.path == default_db_path() {
            if let Ok(path) = std::env::var("ASKDB_DATABASE") {
                self.path = PathBuf::from(path);
            }
        }
        if self.table == default_table() {
            if let Ok(table) = std::env::var("ASKDB_TABLE") {
                self.table = table;
            }
        }
    }
}

/// LLM provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// LLM provider: "openai", "anthropic", or "none".
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model name. Falls back to the provider's environment variable, then
    /// the provider default.
    #[serde(default)]
    pub model: Option<String>,

    /// Upper bound on a whole model resolution, retries included.
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    /// Maximum tokens requested from the model.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_llm_timeout() -> u64 {
    15
}

fn default_max_tokens() -> u32 {
    200
}

fn default_temperature() -> f32 {
    0.1
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            timeout_secs: default_llm_timeout(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

impl LlmConfig {
    /// Parses the configured provider. `None` means the model path is disabled.
    pub fn provider(&self) -> Result<Option<LlmProvider>> {
        match self.provider.to_lowercase().as_str() {
            "none" | "off" | "" => Ok(None),
            other => other.parse().map(Some).map_err(AskError::config),
        }
    }
}

/// Settings shared by both resolution strategies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionConfig {
    /// Row cap applied to non-aggregate queries unless the question asks otherwise.
    #[serde(default = "default_row_cap")]
    pub row_cap: u32,
}

fn default_row_cap() -> u32 {
    10
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            row_cap: default_row_cap(),
        }
    }
}

/// When the schema snapshot is (re)captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaRefresh {
    /// One snapshot for the process lifetime.
    #[default]
    Startup,
    /// Re-read the table description on every request.
    PerRequest,
}

/// Schema snapshot configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaConfig {
    #[serde(default)]
    pub refresh: SchemaRefresh,
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("askdb")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file. A missing file yields defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| AskError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| {
            AskError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.database.table.trim().is_empty() {
            return Err(AskError::config("database.table must not be empty"));
        }
        if self.database.max_connections == 0 {
            return Err(AskError::config("database.max_connections must be at least 1"));
        }
        if self.resolution.row_cap == 0 {
            return Err(AskError::config("resolution.row_cap must be at least 1"));
        }
        if self.llm.timeout_secs == 0 {
            return Err(AskError::config("llm.timeout_secs must be at least 1"));
        }
        self.llm.provider()?;
        Ok(())
    }
}
