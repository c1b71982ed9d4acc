//! Configuration management for freechat.
//!
//! Loads settings from `~/.config/freechat/config.toml` with environment overrides.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODELS_URL: &str = "https://openrouter.ai/api/v1/models";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_models_url")]
    pub models_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Sent as `HTTP-Referer`, used by OpenRouter for app attribution.
    #[serde(default = "default_referer")]
    pub referer: String,
    /// Sent as `X-Title`.
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogConfig {
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportConfig {
    #[serde(default = "default_export_folder")]
    pub folder: PathBuf,
    #[serde(default = "default_true")]
    pub auto_save: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub log_verbosity: LogVerbosity,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogVerbosity {
    Minimal,
    #[default]
    Compact,
    Verbose,
}

// Default value functions
fn default_base_url() -> String { DEFAULT_API_BASE_URL.to_string() }
fn default_models_url() -> String { DEFAULT_MODELS_URL.to_string() }
fn default_referer() -> String { "http://localhost".to_string() }
fn default_title() -> String { "freechat".to_string() }
fn default_timeout_secs() -> u64 { DEFAULT_TIMEOUT_SECS }
fn default_cache_ttl_secs() -> u64 { DEFAULT_CACHE_TTL_SECS }
fn default_export_folder() -> PathBuf { PathBuf::from("exports") }
fn default_true() -> bool { true }

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            models_url: default_models_url(),
            api_key: None,
            referer: default_referer(),
            title: default_title(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The configured key, ignoring blank values.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            folder: default_export_folder(),
            auto_save: default_true(),
        }
    }
}

impl Config {
    /// Get the default config file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("freechat")
            .join("config.toml")
    }

    /// Load config from file, falling back to defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::default_path())
    }

    /// Load config from a specific path.
    pub fn load_from(path: PathBuf) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ConfigError::Io(e)),
        }
    }

    /// Apply environment variable overrides.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var("OPENROUTER_API_KEY") {
            self.api.api_key = Some(key);
        }
        if let Ok(dir) = std::env::var("FREECHAT_EXPORT_DIR") {
            self.export.folder = PathBuf::from(dir);
        }
        if let Ok(val) = std::env::var("FREECHAT_CACHE_TTL_SECS") {
            if let Ok(secs) = val.parse() {
                self.catalog.cache_ttl_secs = secs;
            }
        }
        if let Ok(val) = std::env::var("FREECHAT_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                self.api.timeout_secs = secs;
            }
        }
        self
    }

    /// Render the config for display with the API key masked.
    pub fn to_display_toml(&self) -> Result<String, ConfigError> {
        let mut shown = self.clone();
        if let Some(key) = shown.api.api_key.as_mut() {
            *key = mask_key(key);
        }
        toml::to_string_pretty(&shown).map_err(ConfigError::Serialize)
    }
}

/// Keep the first few characters of a key and hide the rest.
fn mask_key(key: &str) -> String {
    let visible: String = key.chars().take(6).collect();
    if key.chars().count() <= 6 {
        "***".to_string()
    } else {
        format!("{}***", visible)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Serialize(toml::ser::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Serialize(e) => write!(f, "Serialize error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}
