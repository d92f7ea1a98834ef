//! Provider trait, the abstraction over LLM backends.
//!
//! A Provider knows how to send a conversation to an LLM and get a response
//! back. The engine never talks to a provider directly; it goes through a
//! [`ModelHandle`], which binds a provider to one concrete model name and
//! sampling temperature. Two handles (fast and pro tiers) are wired up at
//! construction time.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::Message;

/// Configuration for a provider request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "google/gemini-2.5-flash-preview")
    pub model: String,

    /// The conversation messages
    pub messages: Vec<Message>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Available tools the model can call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

fn default_temperature() -> f32 {
    0.3
}

/// A tool definition sent to the LLM so it knows what tools it can call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// The generated message
    pub message: Message,

    /// Token usage statistics
    pub usage: Option<Usage>,

    /// Which model actually responded (may differ from requested)
    pub model: String,
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// An embedding request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    /// The model to use for embeddings (e.g., "text-embedding-3-small").
    pub model: String,

    /// The texts to embed.
    pub inputs: Vec<String>,
}

/// An embedding response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    /// The embedding vectors, one per input text.
    pub embeddings: Vec<Vec<f32>>,

    /// Which model was used.
    pub model: String,
}

/// The core Provider trait.
///
/// Every LLM backend implements this trait. The engine calls `complete()`
/// without knowing which provider is being used.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openrouter").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError>;

    /// Generate embeddings for the given texts.
    ///
    /// Default implementation returns an error indicating embeddings aren't supported.
    async fn embed(
        &self,
        _request: EmbeddingRequest,
    ) -> std::result::Result<EmbeddingResponse, ProviderError> {
        Err(ProviderError::NotConfigured(format!(
            "Provider '{}' does not support embeddings",
            self.name()
        )))
    }
}

/// Cost/quality tier of a model handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    /// Cheaper, faster model used for small ranking jobs and rephrasing.
    Fast,
    /// Higher-capability model used for orchestration and large ranking jobs.
    Pro,
}

/// A provider bound to one model at one temperature.
#[derive(Clone)]
pub struct ModelHandle {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    tier: ModelTier,
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("tier", &self.tier)
            .finish()
    }
}

impl ModelHandle {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        temperature: f32,
        tier: ModelTier,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
            tier,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn tier(&self) -> ModelTier {
        self.tier
    }

    /// Run a full chat completion with this handle's model and temperature.
    pub async fn complete(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolDefinition>,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: None,
            tools,
        };
        self.provider.complete(request).await
    }

    /// Send a single-prompt request and return the text content.
    pub async fn invoke(
        &self,
        prompt: impl Into<String>,
    ) -> std::result::Result<String, ProviderError> {
        let response = self.complete(vec![Message::user(prompt)], Vec::new()).await?;
        Ok(response.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingProvider {
        seen: Mutex<Vec<ProviderRequest>>,
    }

    #[async_trait]
    impl Provider for RecordingProvider {
        fn name(&self) -> &str {
            "recording"
        }

        async fn complete(
            &self,
            request: ProviderRequest,
        ) -> std::result::Result<ProviderResponse, ProviderError> {
            let reply = format!("echo: {}", request.messages[0].content);
            self.seen.lock().unwrap().push(request);
            Ok(ProviderResponse {
                message: Message::assistant(reply),
                usage: None,
                model: "recording-model".into(),
            })
        }
    }

    #[tokio::test]
    async fn invoke_uses_bound_model_and_temperature() {
        let provider = Arc::new(RecordingProvider { seen: Mutex::new(Vec::new()) });
        let handle = ModelHandle::new(provider.clone(), "flash", 0.3, ModelTier::Fast);

        let out = handle.invoke("rank these").await.unwrap();
        assert_eq!(out, "echo: rank these");

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen[0].model, "flash");
        assert!((seen[0].temperature - 0.3).abs() < f32::EPSILON);
        assert!(seen[0].tools.is_empty());
    }

    #[tokio::test]
    async fn embeddings_unsupported_by_default() {
        let provider = RecordingProvider { seen: Mutex::new(Vec::new()) };
        let err = provider
            .embed(EmbeddingRequest { model: "e".into(), inputs: vec!["x".into()] })
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
    }

    #[test]
    fn tool_definition_serialization() {
        let tool = ToolDefinition {
            name: "faq_lookup".into(),
            description: "Answer policy questions".into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": { "query": { "type": "string" } },
                "required": ["query"]
            }),
        };
        let json = serde_json::to_string(&tool).unwrap();
        assert!(json.contains("faq_lookup"));
        assert!(json.contains("query"));
    }
}
