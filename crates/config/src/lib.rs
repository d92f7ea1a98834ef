//! Configuration loading and validation for Parley.
//!
//! Loads configuration from `~/.parley/config.toml` with environment
//! variable overrides. Validates all settings at startup. Every section
//! is optional in the file; omitted fields take the defaults below.

use parley_core::Language;
use parley_core::token::estimate_tokens;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The root configuration structure.
///
/// Maps directly to `~/.parley/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the model provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// OpenAI-compatible endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Reply language locale (`en`, `ja`, `jp`, ...)
    #[serde(default = "default_language")]
    pub language: String,

    /// Optional JSON corpus loaded into the in-memory vector store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corpus_path: Option<PathBuf>,

    #[serde(default)]
    pub models: ModelsConfig,

    #[serde(default)]
    pub window: WindowConfig,

    #[serde(default)]
    pub safety: SafetyConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub ranker: RankerConfig,

    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub prompts: PromptsConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,
}

fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".into()
}
fn default_language() -> String {
    "en".into()
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
            .field("base_url", &self.base_url)
            .field("language", &self.language)
            .field("corpus_path", &self.corpus_path)
            .field("models", &self.models)
            .field("window", &self.window)
            .field("safety", &self.safety)
            .field("cache", &self.cache)
            .field("ranker", &self.ranker)
            .field("agent", &self.agent)
            .field("prompts", &self.prompts)
            .field("gateway", &self.gateway)
            .finish()
    }
}

/// Model names for the two cost/quality tiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    #[serde(default = "default_fast_model")]
    pub fast: String,

    #[serde(default = "default_pro_model")]
    pub pro: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Embedding model. When absent, retrieval ranks by keyword overlap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<String>,
}

fn default_fast_model() -> String {
    "google/gemini-2.5-flash-preview".into()
}
fn default_pro_model() -> String {
    "google/gemini-2.5-pro-preview-03-25".into()
}
fn default_temperature() -> f32 {
    0.3
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            fast: default_fast_model(),
            pro: default_pro_model(),
            temperature: default_temperature(),
            embedding: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Estimated-token budget for marker plus history
    #[serde(default = "default_budget")]
    pub budget: usize,

    #[serde(default = "default_marker")]
    pub marker: String,
}

fn default_budget() -> usize {
    600
}
fn default_marker() -> String {
    "<REMIXED>".into()
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            budget: default_budget(),
            marker: default_marker(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyConfig {
    #[serde(default = "default_lockout_threshold")]
    pub lockout_threshold: u32,

    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,

    /// Upper bound on sessions the violation ledger remembers
    #[serde(default = "default_max_tracked_sessions")]
    pub max_tracked_sessions: usize,
}

fn default_lockout_threshold() -> u32 {
    3
}
fn default_max_message_chars() -> usize {
    2000
}
fn default_max_tracked_sessions() -> usize {
    10_000
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            lockout_threshold: default_lockout_threshold(),
            max_message_chars: default_max_message_chars(),
            max_tracked_sessions: default_max_tracked_sessions(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_faq_ttl_secs")]
    pub faq_ttl_secs: u64,

    /// Spawn a background sweeper at this interval. Expiry is enforced on
    /// read regardless.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sweep_interval_secs: Option<u64>,
}

fn default_faq_ttl_secs() -> u64 {
    3600
}

impl CacheConfig {
    pub fn faq_ttl(&self) -> Duration {
        Duration::from_secs(self.faq_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Option<Duration> {
        self.sweep_interval_secs
            .filter(|s| *s > 0)
            .map(Duration::from_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            faq_ttl_secs: default_faq_ttl_secs(),
            sweep_interval_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankerConfig {
    /// Corpora at or below this size are read whole instead of searched
    #[serde(default = "default_small_corpus_limit")]
    pub small_corpus_limit: usize,

    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,

    /// Candidate counts at or below this use the fast model
    #[serde(default = "default_fast_tier_max")]
    pub fast_tier_max: usize,

    #[serde(default = "default_excerpt_chars")]
    pub excerpt_chars: usize,

    #[serde(default = "default_retrieval_k")]
    pub retrieval_k: usize,

    #[serde(default = "default_location_terms")]
    pub location_terms: Vec<String>,
}

fn default_small_corpus_limit() -> usize {
    25
}
fn default_max_candidates() -> usize {
    20
}
fn default_fast_tier_max() -> usize {
    20
}
fn default_excerpt_chars() -> usize {
    140
}
fn default_retrieval_k() -> usize {
    10
}
fn default_location_terms() -> Vec<String> {
    ["tokyo", "remote", "東京", "リモート"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            small_corpus_limit: default_small_corpus_limit(),
            max_candidates: default_max_candidates(),
            fast_tier_max: default_fast_tier_max(),
            excerpt_chars: default_excerpt_chars(),
            retrieval_k: default_retrieval_k(),
            location_terms: default_location_terms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum model round-trips per `chat` call
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

fn default_max_iterations() -> usize {
    6
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptsConfig {
    /// Directory with `<en|jp>/<system|lite>.md`. Built-in prompts otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    5000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            language: default_language(),
            corpus_path: None,
            models: ModelsConfig::default(),
            window: WindowConfig::default(),
            safety: SafetyConfig::default(),
            cache: CacheConfig::default(),
            ranker: RankerConfig::default(),
            agent: AgentConfig::default(),
            prompts: PromptsConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.parley/config.toml).
    ///
    /// Also checks environment variables:
    /// - `PARLEY_API_KEY`, then `OPENROUTER_API_KEY`, then `OPENAI_API_KEY`
    /// - `PARLEY_LANGUAGE`
    /// - `PARLEY_CORPUS`
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_dir().join("config.toml"))
    }

    /// Load configuration from a specific file path, then apply environment
    /// overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::read_file(path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Apply environment overrides through `lookup`.
    ///
    /// A key from the file wins over environment keys; the language and
    /// corpus variables override the file.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = ["PARLEY_API_KEY", "OPENROUTER_API_KEY", "OPENAI_API_KEY"]
                .iter()
                .find_map(|k| lookup(k).filter(|v| !v.is_empty()));
        }

        if let Some(language) = lookup("PARLEY_LANGUAGE").filter(|v| !v.is_empty()) {
            self.language = language;
        }

        if let Some(corpus) = lookup("PARLEY_CORPUS").filter(|v| !v.is_empty()) {
            self.corpus_path = Some(PathBuf::from(corpus));
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".parley")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.models.temperature < 0.0 || self.models.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "models.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.window.budget == 0 {
            return Err(ConfigError::ValidationError(
                "window.budget must be > 0".into(),
            ));
        }

        if self.window.budget < estimate_tokens(&self.window.marker) {
            return Err(ConfigError::ValidationError(
                "window.budget must cover the estimated cost of window.marker".into(),
            ));
        }

        if self.safety.lockout_threshold == 0 {
            return Err(ConfigError::ValidationError(
                "safety.lockout_threshold must be >= 1".into(),
            ));
        }

        if self.safety.max_tracked_sessions == 0 {
            return Err(ConfigError::ValidationError(
                "safety.max_tracked_sessions must be > 0".into(),
            ));
        }

        if self.ranker.max_candidates == 0 {
            return Err(ConfigError::ValidationError(
                "ranker.max_candidates must be > 0".into(),
            ));
        }

        if self.ranker.fast_tier_max > self.ranker.max_candidates {
            return Err(ConfigError::ValidationError(
                "ranker.fast_tier_max must not exceed ranker.max_candidates".into(),
            ));
        }

        if self.agent.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_iterations must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// The reply language bucket for the configured locale.
    pub fn language(&self) -> Language {
        Language::from_locale(&self.language)
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
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

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
