//! TOML-based configuration for Dossier
//!
//! Configuration lives in a single TOML file (`dossier.toml` by default).
//! Every section and field has a default, so an empty file is a valid
//! configuration. Secrets are never stored in the file; fields ending in
//! `_env` name the environment variable that holds the value.
//!
//! Use [`DossierConfigManager`] for shared, lock-free access to the current
//! configuration.

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::pipeline::DEFAULT_STEP_BUDGET;
use crate::report::assembler::{DEFAULT_HERO_PLACEHOLDER, DEFAULT_SOURCE_PLACEHOLDER};
use crate::tools::images::DEFAULT_PEXELS_URL;
use crate::tools::tavily::DEFAULT_TAVILY_URL;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "dossier.toml";

/// Root configuration structure loaded from dossier.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DossierConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub images: ImagesConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ============= Pipeline Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Maximum node executions per run
    #[serde(default = "default_step_budget")]
    pub step_budget: usize,

    /// Number of search results handed to extraction
    #[serde(default = "default_max_sources")]
    pub max_sources: usize,

    /// Characters kept from each extracted page
    #[serde(default = "default_extract_max_chars")]
    pub extract_max_chars: usize,
}

fn default_step_budget() -> usize {
    DEFAULT_STEP_BUDGET
}

fn default_max_sources() -> usize {
    10
}

fn default_extract_max_chars() -> usize {
    4000
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            step_budget: default_step_budget(),
            max_sources: default_max_sources(),
            extract_max_chars: default_extract_max_chars(),
        }
    }
}

// ============= LLM Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API, e.g. `http://localhost:11434/v1`
    #[serde(default = "default_llm_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Environment variable holding the API key; set to "" for servers without auth
    #[serde(default = "default_llm_key_env")]
    pub api_key_env: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

fn default_llm_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_llm_key_env() -> Option<String> {
    Some("OPENAI_API_KEY".to_string())
}

fn default_temperature() -> f32 {
    0.0
}

fn default_llm_timeout() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_url(),
            model: default_model(),
            api_key_env: default_llm_key_env(),
            temperature: default_temperature(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

// ============= Search Configuration =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchProviderKind {
    #[default]
    Duckduckgo,
    Tavily,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub provider: SearchProviderKind,

    /// Required for Tavily
    #[serde(default)]
    pub api_key_env: Option<String>,

    #[serde(default = "default_tavily_url")]
    pub base_url: String,

    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

fn default_tavily_url() -> String {
    DEFAULT_TAVILY_URL.to_string()
}

fn default_search_timeout() -> u64 {
    30
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider: SearchProviderKind::default(),
            api_key_env: None,
            base_url: default_tavily_url(),
            timeout_secs: default_search_timeout(),
        }
    }
}

// ============= Image Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagesConfig {
    #[serde(default = "default_pexels_url")]
    pub base_url: String,

    /// Without a key image lookups are skipped and placeholders are used
    #[serde(default = "default_pexels_key_env")]
    pub api_key_env: Option<String>,

    #[serde(default = "default_per_page")]
    pub per_page: u32,

    #[serde(default = "default_hero_placeholder")]
    pub hero_placeholder: String,

    #[serde(default = "default_source_placeholder")]
    pub source_placeholder: String,

    #[serde(default = "default_images_timeout")]
    pub timeout_secs: u64,
}

fn default_pexels_url() -> String {
    DEFAULT_PEXELS_URL.to_string()
}

fn default_pexels_key_env() -> Option<String> {
    Some("PEXELS_API_KEY".to_string())
}

fn default_per_page() -> u32 {
    5
}

fn default_hero_placeholder() -> String {
    DEFAULT_HERO_PLACEHOLDER.to_string()
}

fn default_source_placeholder() -> String {
    DEFAULT_SOURCE_PLACEHOLDER.to_string()
}

fn default_images_timeout() -> u64 {
    15
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            base_url: default_pexels_url(),
            api_key_env: default_pexels_key_env(),
            per_page: default_per_page(),
            hero_placeholder: default_hero_placeholder(),
            source_placeholder: default_source_placeholder(),
            timeout_secs: default_images_timeout(),
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),
}

impl DossierConfig {
    /// Load and validate configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config = Self::parse(&content)?;
        config.validate()?;

        Ok(config)
    }

    /// Parse without validating
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Validate the configuration for internal consistency and env var availability
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.step_budget == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.step_budget must be greater than 0".to_string(),
            ));
        }
        if self.pipeline.max_sources == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.max_sources must be greater than 0".to_string(),
            ));
        }
        if self.pipeline.extract_max_chars == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.extract_max_chars must be greater than 0".to_string(),
            ));
        }
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::ValidationError("llm.model must not be empty".to_string()));
        }
        if self.llm.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "llm.base_url must not be empty".to_string(),
            ));
        }

        if let Some(env) = self.llm.api_key_env.as_deref().filter(|e| !e.is_empty()) {
            self.validate_env_var(env)?;
        }

        if self.search.provider == SearchProviderKind::Tavily {
            let env = self.search.api_key_env.as_deref().ok_or_else(|| {
                ConfigError::ValidationError(
                    "search.api_key_env is required when search.provider = \"tavily\"".to_string(),
                )
            })?;
            self.validate_env_var(env)?;
        }

        Ok(())
    }

    fn validate_env_var(&self, name: &str) -> Result<(), ConfigError> {
        std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))?;
        Ok(())
    }

    /// Get a resolved value from an optional env var reference
    pub fn resolve_env(&self, env_name: Option<&str>) -> Option<String> {
        env_name
            .filter(|name| !name.is_empty())
            .and_then(|name| std::env::var(name).ok())
            .filter(|value| !value.is_empty())
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm.timeout_secs)
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search.timeout_secs)
    }

    pub fn images_timeout(&self) -> Duration {
        Duration::from_secs(self.images.timeout_secs)
    }
}

// ============= Configuration Manager =============

/// Thread-safe holder of the current configuration
#[derive(Clone)]
pub struct DossierConfigManager {
    config: Arc<ArcSwap<DossierConfig>>,
    config_path: Option<PathBuf>,
}

impl DossierConfigManager {
    /// Load the initial config from `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let config = DossierConfig::load(&path)?;

        Ok(Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            config_path: Some(path),
        })
    }

    /// Create a config manager directly from a config (useful for testing)
    pub fn from_config(config: DossierConfig) -> Self {
        Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            config_path: None,
        }
    }

    /// Get the current configuration (lockless read)
    pub fn config(&self) -> Arc<DossierConfig> {
        self.config.load_full()
    }

    pub fn path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Reload the configuration from disk; a manager built from a value keeps it
    pub fn reload(&self) -> Result<(), ConfigError> {
        self.reload_with(|_| Ok::<_, ConfigError>(())).map(|_| ())
    }

    /// Reload from disk and derive `T` from the new configuration
    ///
    /// The new configuration is only published once `build` succeeds, so a
    /// failed reload leaves both the configuration and anything built from
    /// it untouched. Returns `None` when the manager has no backing file.
    pub fn reload_with<T, E>(&self, build: impl FnOnce(&DossierConfig) -> Result<T, E>) -> Result<Option<T>, E>
    where
        E: From<ConfigError>,
    {
        let Some(path) = &self.config_path else {
            return Ok(None);
        };
        info!("Reloading configuration from {:?}", path);

        let new_config = DossierConfig::load(path)?;
        let built = build(&new_config)?;
        self.config.store(Arc::new(new_config));

        info!("Configuration reloaded successfully");
        Ok(Some(built))
    }
}
