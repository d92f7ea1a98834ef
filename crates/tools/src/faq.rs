//! FAQ lookup tool: policy and benefit questions.
//!
//! Lookup order: built-in answers, then the TTL cache, then a similarity
//! search over the corpus. Only answers from the search are cached.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parley_core::cache::TtlCache;
use parley_core::error::{RetrievalError, ToolError};
use parley_core::retrieval::VectorStore;
use parley_core::tool::{Tool, ToolContext, ToolResult, parse_arguments};
use serde::Deserialize;
use tracing::debug;

/// Returned when neither the built-ins nor the corpus know the answer.
pub const FAQ_NOT_FOUND: &str = "FAQ_NOT_FOUND";

const SEARCH_K: usize = 2;

pub type FaqCache = TtlCache<String, String>;

fn builtin_answers() -> HashMap<String, String> {
    HashMap::from([(
        "remote-japan".to_string(),
        "“Remote-Japan” means you can work from **anywhere inside Japan**; Zeal cannot support full-time employees living abroad right now.".to_string(),
    )])
}

pub struct FaqTool {
    store: Arc<dyn VectorStore>,
    cache: Arc<FaqCache>,
    builtin: HashMap<String, String>,
}

#[derive(Deserialize)]
struct FaqArgs {
    query: String,
}

impl FaqTool {
    pub fn new(store: Arc<dyn VectorStore>, cache: Arc<FaqCache>) -> Self {
        Self {
            store,
            cache,
            builtin: builtin_answers(),
        }
    }

    /// Answer a question, consulting the corpus only on a cache miss.
    pub async fn lookup(&self, query: &str) -> Result<String, RetrievalError> {
        let key = query.trim().to_lowercase();

        if let Some(answer) = self.builtin.get(&key) {
            return Ok(answer.clone());
        }

        if let Some(answer) = self.cache.get(&key) {
            debug!(key = %key, "FAQ cache hit");
            return Ok(answer);
        }

        let docs = self.store.similarity_search(&key, SEARCH_K).await?;
        let answer = if docs.is_empty() {
            FAQ_NOT_FOUND.to_string()
        } else {
            docs.iter()
                .map(|d| d.page_content.as_str())
                .collect::<Vec<_>>()
                .join("\n\n")
        };

        self.cache.insert(key, answer.clone());
        Ok(answer)
    }
}

#[async_trait]
impl Tool for FaqTool {
    fn name(&self) -> &str {
        "faq_lookup"
    }

    fn description(&self) -> &str {
        "Answer policy / benefit questions."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The policy or benefit question"
                }
            },
            "required": ["query"],
            "additionalProperties": false
        })
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
        _context: &ToolContext,
    ) -> Result<ToolResult, ToolError> {
        let args: FaqArgs = parse_arguments(self.name(), arguments)?;
        Ok(ToolResult::ok(self.lookup(&args.query).await?))
    }
}
