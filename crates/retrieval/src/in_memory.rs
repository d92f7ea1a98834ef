//! In-memory vector store: the default corpus backend.
//!
//! Documents live in a `Vec` in insertion order. Search ranks them by
//! cosine similarity when an embedder is attached, otherwise by keyword
//! overlap. An empty query returns the corpus in insertion order.

use std::sync::Arc;

use async_trait::async_trait;
use parley_core::error::RetrievalError;
use parley_core::message::Turn;
use parley_core::provider::{EmbeddingRequest, Provider};
use parley_core::retrieval::{Document, IndexStats, VectorStore};
use tokio::sync::RwLock;
use tracing::debug;

use crate::rephrase::QueryRephraser;
use crate::scoring::{cosine_similarity, keyword_score, rank, tokenize};

const DEFAULT_RETRIEVAL_K: usize = 10;

/// An embedding model reached through a provider.
#[derive(Clone)]
pub struct Embedder {
    provider: Arc<dyn Provider>,
    model: String,
}

impl Embedder {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    async fn embed(&self, inputs: Vec<String>) -> Result<Vec<Vec<f32>>, RetrievalError> {
        let expected = inputs.len();
        let response = self
            .provider
            .embed(EmbeddingRequest {
                model: self.model.clone(),
                inputs,
            })
            .await
            .map_err(|e| RetrievalError::EmbeddingFailed(e.to_string()))?;

        if response.embeddings.len() != expected {
            return Err(RetrievalError::EmbeddingFailed(format!(
                "expected {expected} embeddings, got {}",
                response.embeddings.len()
            )));
        }
        Ok(response.embeddings)
    }
}

struct IndexedDocument {
    document: Document,
    /// Lowercased content plus title/location metadata, for keyword search.
    haystack: String,
    embedding: Option<Vec<f32>>,
}

impl IndexedDocument {
    fn new(document: Document, embedding: Option<Vec<f32>>) -> Self {
        let mut haystack = document.page_content.to_lowercase();
        for key in ["title", "location"] {
            if let Some(value) = document.meta_str(key) {
                haystack.push(' ');
                haystack.push_str(&value.to_lowercase());
            }
        }
        Self {
            document,
            haystack,
            embedding,
        }
    }
}

pub struct InMemoryVectorStore {
    documents: RwLock<Vec<IndexedDocument>>,
    embedder: Option<Embedder>,
    rephraser: Option<QueryRephraser>,
    retrieval_k: usize,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(Vec::new()),
            embedder: None,
            rephraser: None,
            retrieval_k: DEFAULT_RETRIEVAL_K,
        }
    }

    /// Rank by embedding similarity instead of keywords.
    pub fn with_embedder(mut self, embedder: Embedder) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Rewrite follow-up questions before history-aware retrieval.
    pub fn with_rephraser(mut self, rephraser: QueryRephraser) -> Self {
        self.rephraser = Some(rephraser);
        self
    }

    /// Number of documents history-aware retrieval returns.
    pub fn with_retrieval_k(mut self, k: usize) -> Self {
        self.retrieval_k = k;
        self
    }

    /// Index documents, embedding them first when an embedder is attached.
    pub async fn add_documents(&self, documents: Vec<Document>) -> Result<usize, RetrievalError> {
        if documents.is_empty() {
            return Ok(0);
        }

        let embeddings: Vec<Option<Vec<f32>>> = match &self.embedder {
            Some(embedder) => {
                let inputs = documents.iter().map(|d| d.page_content.clone()).collect();
                embedder.embed(inputs).await?.into_iter().map(Some).collect()
            }
            None => vec![None; documents.len()],
        };

        let added = documents.len();
        let mut store = self.documents.write().await;
        store.extend(
            documents
                .into_iter()
                .zip(embeddings)
                .map(|(doc, emb)| IndexedDocument::new(doc, emb)),
        );
        debug!(added, total = store.len(), "Documents indexed");
        Ok(added)
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl std::fmt::Debug for InMemoryVectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryVectorStore")
            .field("documents", &self.documents.try_read().map(|d| d.len()).ok())
            .field("embeddings", &self.embedder.is_some())
            .field("rephraser", &self.rephraser.is_some())
            .field("retrieval_k", &self.retrieval_k)
            .finish()
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn describe_index_stats(&self) -> Result<IndexStats, RetrievalError> {
        Ok(IndexStats {
            total_record_count: self.len().await,
        })
    }

    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<Document>, RetrievalError> {
        let query = query.trim();
        if query.is_empty() {
            let store = self.documents.read().await;
            return Ok(store.iter().take(k).map(|d| d.document.clone()).collect());
        }

        // Embed before taking the lock; the call suspends.
        let query_embedding = match &self.embedder {
            Some(embedder) => embedder
                .embed(vec![query.to_string()])
                .await?
                .into_iter()
                .next(),
            None => None,
        };

        let store = self.documents.read().await;
        let scored: Vec<(f32, usize)> = match &query_embedding {
            Some(q) => store
                .iter()
                .enumerate()
                .filter_map(|(i, d)| d.embedding.as_ref().map(|e| (cosine_similarity(e, q), i)))
                .collect(),
            None => {
                let terms = tokenize(query);
                store
                    .iter()
                    .enumerate()
                    .map(|(i, d)| (keyword_score(&terms, &d.haystack), i))
                    .filter(|(score, _)| *score > 0.0)
                    .collect()
            }
        };

        Ok(rank(scored, k)
            .into_iter()
            .map(|i| store[i].document.clone())
            .collect())
    }

    async fn history_aware_retrieve(
        &self,
        query: &str,
        history: &[Turn],
    ) -> Result<Vec<Document>, RetrievalError> {
        let standalone = match &self.rephraser {
            Some(rephraser) => rephraser.rephrase(query, history).await?,
            None => query.to_string(),
        };
        self.similarity_search(&standalone, self.retrieval_k).await
    }

    async fn list_documents(&self, limit: usize) -> Result<Vec<Document>, RetrievalError> {
        let store = self.documents.read().await;
        Ok(store.iter().take(limit).map(|d| d.document.clone()).collect())
    }
}
