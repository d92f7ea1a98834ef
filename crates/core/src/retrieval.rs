//! Vector store trait: the engine's view of the document corpus.
//!
//! The index and its similarity algorithm are external; the engine only
//! needs corpus statistics, plain similarity search, and a retrieval that
//! takes the conversation into account when resolving follow-up questions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RetrievalError;
use crate::message::Turn;

/// One indexed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// The text body that was embedded/indexed.
    #[serde(rename = "pageContent", alias = "page_content")]
    pub page_content: String,

    /// Free-form metadata (`title`, `location`, ...).
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Document {
    pub fn new(page_content: impl Into<String>) -> Self {
        Self {
            page_content: page_content.into(),
            metadata: serde_json::Map::new(),
        }
    }

    /// Attach a string metadata field.
    pub fn with_meta(mut self, key: &str, value: impl Into<String>) -> Self {
        self.metadata
            .insert(key.to_string(), serde_json::Value::String(value.into()));
        self
    }

    /// Read a string metadata field.
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }
}

/// Index statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    #[serde(rename = "totalRecordCount")]
    pub total_record_count: usize,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Report how many documents the index holds.
    async fn describe_index_stats(&self) -> Result<IndexStats, RetrievalError>;

    /// Return up to `k` documents most similar to `query`.
    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<Document>, RetrievalError>;

    /// Retrieve documents for a query that may only make sense in light of
    /// the preceding conversation.
    async fn history_aware_retrieve(
        &self,
        query: &str,
        history: &[Turn],
    ) -> Result<Vec<Document>, RetrievalError>;

    /// Return the corpus directly, bypassing ranking.
    ///
    /// Default: an empty-query similarity search, which every store answers
    /// with its documents in index order.
    async fn list_documents(&self, limit: usize) -> Result<Vec<Document>, RetrievalError> {
        self.similarity_search("", limit).await
    }
}
