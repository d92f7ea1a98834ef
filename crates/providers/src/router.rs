//! Model tiers: builds the fast and pro model handles from config.
//!
//! Both tiers share one provider connection; they differ only in the model
//! name sent with each request.

use std::sync::Arc;

use parley_config::AppConfig;
use parley_core::provider::{ModelHandle, ModelTier, Provider};
use tracing::{info, warn};

use crate::openai_compat::OpenAiCompatProvider;

/// The models a running engine talks to.
#[derive(Clone)]
pub struct ModelSet {
    /// Cheaper model: small ranking jobs and query rephrasing.
    pub fast: ModelHandle,
    /// Orchestration and large ranking jobs.
    pub pro: ModelHandle,
    /// Embedding model name, when configured.
    pub embedding: Option<String>,
    provider: Arc<dyn Provider>,
}

impl ModelSet {
    /// Bind both tiers to an existing provider.
    pub fn with_provider(provider: Arc<dyn Provider>, config: &AppConfig) -> Self {
        let models = &config.models;
        Self {
            fast: ModelHandle::new(
                provider.clone(),
                &models.fast,
                models.temperature,
                ModelTier::Fast,
            ),
            pro: ModelHandle::new(
                provider.clone(),
                &models.pro,
                models.temperature,
                ModelTier::Pro,
            ),
            embedding: models.embedding.clone(),
            provider,
        }
    }

    /// The shared provider (used for embeddings).
    pub fn provider(&self) -> Arc<dyn Provider> {
        self.provider.clone()
    }
}

impl std::fmt::Debug for ModelSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSet")
            .field("fast", &self.fast)
            .field("pro", &self.pro)
            .field("embedding", &self.embedding)
            .field("provider", &self.provider.name())
            .finish()
    }
}

/// Build the model set from configuration using the OpenAI-compatible
/// provider at `config.base_url`.
pub fn build_from_config(config: &AppConfig) -> ModelSet {
    let api_key = config.api_key.clone().unwrap_or_default();
    if api_key.is_empty() {
        warn!("No API key configured; model calls will be rejected upstream");
    }

    let name = provider_name(&config.base_url);
    let provider: Arc<dyn Provider> =
        Arc::new(OpenAiCompatProvider::new(name, &config.base_url, api_key));

    info!(
        provider = name,
        fast = %config.models.fast,
        pro = %config.models.pro,
        "Model tiers configured"
    );

    ModelSet::with_provider(provider, config)
}

/// Friendly provider name for well-known endpoints.
fn provider_name(base_url: &str) -> &'static str {
    if base_url.contains("openrouter.ai") {
        "openrouter"
    } else if base_url.contains("api.openai.com") {
        "openai"
    } else if base_url.contains("localhost:11434") {
        "ollama"
    } else {
        "custom"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_use_configured_models() {
        let config = AppConfig::default();
        let models = build_from_config(&config);

        assert_eq!(models.fast.model(), "google/gemini-2.5-flash-preview");
        assert_eq!(models.fast.tier(), ModelTier::Fast);
        assert_eq!(models.pro.model(), "google/gemini-2.5-pro-preview-03-25");
        assert_eq!(models.pro.tier(), ModelTier::Pro);
        assert!(models.embedding.is_none());
        assert_eq!(models.provider().name(), "openrouter");
    }

    #[test]
    fn embedding_model_passed_through() {
        let mut config = AppConfig::default();
        config.base_url = "http://localhost:11434/v1".into();
        config.models.embedding = Some("nomic-embed-text".into());
        let models = build_from_config(&config);

        assert_eq!(models.embedding.as_deref(), Some("nomic-embed-text"));
        assert_eq!(models.provider().name(), "ollama");
    }

    #[test]
    fn debug_shows_tiers_and_provider() {
        let models = build_from_config(&AppConfig::default());
        let out = format!("{models:?}");
        assert!(out.contains("ModelSet"));
        assert!(out.contains("gemini-2.5-flash-preview"));
        assert!(out.contains("openrouter"));
    }

    #[test]
    fn unknown_endpoint_is_custom() {
        assert_eq!(provider_name("https://llm.internal/v1"), "custom");
        assert_eq!(provider_name("https://api.openai.com/v1"), "openai");
    }
}
