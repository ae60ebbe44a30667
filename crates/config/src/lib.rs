//! Configuration loading, validation, and management for TeamMate.
//!
//! Loads configuration from `~/.teammate/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Port used when `VITE_WEBSOCKET_URL` is not set.
pub const DEFAULT_PORT: u16 = 6789;

/// The root configuration structure.
///
/// Maps directly to `~/.teammate/config.toml`.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Text-generation provider
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Vector-search backend
    #[serde(default)]
    pub vector_store: VectorStoreConfig,

    /// Gateway listener
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Schema file and upload staging
    #[serde(default)]
    pub data: DataConfig,

    /// Retrieval-augmented context for chat replies
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("generation", &self.generation)
            .field("vector_store", &self.vector_store)
            .field("gateway", &self.gateway)
            .field("data", &self.data)
            .field("retrieval", &self.retrieval)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// System prompt; `{context}` is replaced by the retrieval context.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-3.5-turbo".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_system_prompt() -> String {
    "You are TeamMate. TeamMate is a helpful assistant. Use the following context: {context}"
        .into()
}
fn default_timeout_secs() -> u64 {
    120
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            model: default_model(),
            temperature: default_temperature(),
            system_prompt: default_system_prompt(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    #[serde(default = "default_vector_store_url")]
    pub url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_vector_store_url() -> String {
    "http://localhost:8080".into()
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            url: default_vector_store_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_host() -> String {
    "0.0.0.0".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// JSON schema document read by `create-schema` and `reset-schema`
    #[serde(default = "default_schema_path")]
    pub schema_path: PathBuf,

    /// Where uploaded CSV files are written before import
    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,

    /// Class used when a request does not name one
    #[serde(default = "default_class")]
    pub default_class: String,
}

fn default_schema_path() -> PathBuf {
    PathBuf::from("schema.json")
}
fn default_staging_dir() -> PathBuf {
    std::env::temp_dir().join("teammate")
}
fn default_class() -> String {
    "Job".into()
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            schema_path: default_schema_path(),
            staging_dir: default_staging_dir(),
            default_class: default_class(),
        }
    }
}

/// When `class_name` is set, chat replies are grounded in a semantic
/// search over that class. Off by default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.teammate/config.toml),
    /// then apply environment overrides:
    /// - `OPENAI_API_KEY`
    /// - `TEAMMATE_GENERATION_URL`, `TEAMMATE_MODEL`
    /// - `WEAVIATE_URL`
    /// - `VITE_WEBSOCKET_URL` (listen port is its last `:` segment)
    /// - `TEAMMATE_SCHEMA_PATH`, `TEAMMATE_STAGING_DIR`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
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
    /// Taking the lookup as a closure keeps tests off the process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.generation.api_key = Some(key);
        }
        if let Some(url) = lookup("TEAMMATE_GENERATION_URL") {
            self.generation.api_url = url;
        }
        if let Some(model) = lookup("TEAMMATE_MODEL") {
            self.generation.model = model;
        }
        if let Some(url) = lookup("WEAVIATE_URL") {
            self.vector_store.url = url;
        }
        // Blank in `.env` templates means unset.
        if let Some(ws_url) = lookup("VITE_WEBSOCKET_URL").filter(|v| !v.trim().is_empty()) {
            self.gateway.port = port_from_websocket_url(&ws_url)?;
        }
        if let Some(path) = lookup("TEAMMATE_SCHEMA_PATH") {
            self.data.schema_path = PathBuf::from(path);
        }
        if let Some(dir) = lookup("TEAMMATE_STAGING_DIR") {
            self.data.staging_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".teammate")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(ConfigError::ValidationError(
                "generation.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.vector_store.url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "vector_store.url must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Check if a generation API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.generation.api_key.is_some()
    }
}

/// Extract the listen port from a websocket URL such as `ws://host:6789`.
///
/// The port is whatever follows the last `:`, trailing path ignored.
pub fn port_from_websocket_url(url: &str) -> Result<u16, ConfigError> {
    let tail = url
        .rsplit(':')
        .next()
        .unwrap_or_default()
        .split('/')
        .next()
        .unwrap_or_default();

    tail.parse::<u16>().map_err(|_| {
        ConfigError::ValidationError(format!("VITE_WEBSOCKET_URL has no valid port: {url}"))
    })
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

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for teammate_core::Error {
    fn from(e: ConfigError) -> Self {
        teammate_core::Error::Config {
            message: e.to_string(),
        }
    }
}
