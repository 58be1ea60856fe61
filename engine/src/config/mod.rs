//! Configuration management
//!
//! This module handles loading, validation, and management of the Wayfarer
//! configuration. Configuration is stored in TOML format at
//! ~/.wayfarer/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Log level, data directory
//! - **server**: HTTP bind host and port
//! - **llm**: Provider selection, context window, per-provider settings
//! - **weather**: Geocoding/forecast base URLs and forecast window
//!
//! # Path Expansion
//!
//! The configuration system automatically expands a leading ~ in
//! `core.data_dir` to the user's home directory and creates the data
//! directory if it doesn't exist.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
///
/// This structure represents the complete Wayfarer configuration loaded from
/// ~/.wayfarer/config.toml. Every section falls back to defaults when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Core engine settings
    #[serde(default)]
    pub core: CoreConfig,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// LLM provider configuration
    #[serde(default)]
    pub llm: LLMConfig,

    /// Weather lookup configuration
    #[serde(default)]
    pub weather: WeatherConfig,
}

/// Core engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Data directory path (supports ~ expansion); holds the session database
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind host
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    /// Default LLM provider (ollama, openai)
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Number of trailing history records (not turns) included in the
    /// response-synthesis prompt
    #[serde(default = "default_context_window")]
    pub context_window: usize,

    /// Ollama provider settings
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// OpenAI provider settings
    #[serde(default)]
    pub openai: OpenAIConfig,
}

/// Ollama provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Base URL for Ollama API
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

/// OpenAI provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    /// Base URL for OpenAI-compatible API
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_openai_model")]
    pub model: String,

    /// API key; when empty, the OPENAI_API_KEY environment variable is used
    #[serde(default)]
    pub api_key: String,
}

/// Weather lookup configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Base URL of the geocoding service
    #[serde(default = "default_geocoding_url")]
    pub geocoding_url: String,

    /// Base URL of the forecast service
    #[serde(default = "default_forecast_url")]
    pub forecast_url: String,

    /// Number of upcoming days summarized in a forecast
    #[serde(default = "default_forecast_days")]
    pub forecast_days: usize,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("~/.wayfarer")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_provider() -> String {
    "ollama".to_string()
}

fn default_context_window() -> usize {
    10
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_geocoding_url() -> String {
    "https://geocoding-api.open-meteo.com".to_string()
}

fn default_forecast_url() -> String {
    "https://api.open-meteo.com".to_string()
}

fn default_forecast_days() -> usize {
    5
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            data_dir: default_data_dir(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            context_window: default_context_window(),
            ollama: OllamaConfig::default(),
            openai: OpenAIConfig::default(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            model: default_ollama_model(),
        }
    }
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            model: default_openai_model(),
            api_key: String::new(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            geocoding_url: default_geocoding_url(),
            forecast_url: default_forecast_url(),
            forecast_days: default_forecast_days(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            core: CoreConfig::default(),
            server: ServerConfig::default(),
            llm: LLMConfig::default(),
            weather: WeatherConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.wayfarer/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default
    /// configuration file and returns it. Validates the configuration after
    /// loading.
    pub fn load_or_create() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let mut config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        config.validate_and_process()?;

        Ok(config)
    }

    /// Create a default configuration and save it to `path`
    fn create_default(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let mut config = Self::default();
        config.validate_and_process()?;

        let toml_string =
            toml::to_string_pretty(&config).context("Failed to serialize default config")?;
        fs::write(path, toml_string)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;

        tracing::info!("Created default config at {}", path.display());

        Ok(config)
    }

    /// Get the default configuration file path (~/.wayfarer/config.toml)
    fn default_config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".wayfarer").join("config.toml"))
    }

    /// Path of the session database inside the data directory
    pub fn db_path(&self) -> PathBuf {
        self.core.data_dir.join("sessions.db")
    }

    /// Validate and process configuration
    ///
    /// Validates field values and expands ~ in the data directory path.
    fn validate_and_process(&mut self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            anyhow::bail!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            );
        }

        let valid_providers = ["ollama", "openai"];
        if !valid_providers.contains(&self.llm.default_provider.as_str()) {
            anyhow::bail!(
                "Invalid default provider '{}'. Must be one of: {}",
                self.llm.default_provider,
                valid_providers.join(", ")
            );
        }

        if self.llm.context_window == 0 {
            anyhow::bail!("llm.context_window must be at least 1");
        }

        if self.weather.forecast_days == 0 {
            anyhow::bail!("weather.forecast_days must be at least 1");
        }

        self.core.data_dir = Self::expand_home(&self.core.data_dir);

        Ok(())
    }

    /// Expand a leading ~ to the user's home directory
    fn expand_home(path: &Path) -> PathBuf {
        let Some(path_str) = path.to_str() else {
            return path.to_path_buf();
        };
        if let Some(rest) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        path.to_path_buf()
    }
}
