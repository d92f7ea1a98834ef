//! Scripted collaborators shared by the tool tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parley_core::error::{ProviderError, RetrievalError};
use parley_core::message::{Message, Turn};
use parley_core::provider::{Provider, ProviderRequest, ProviderResponse};
use parley_core::retrieval::{Document, IndexStats, VectorStore};

pub fn job(title: &str, location: &str, body: &str) -> Document {
    Document::new(body)
        .with_meta("title", title)
        .with_meta("location", location)
}

/// A vector store over a fixed list that counts every call.
#[derive(Default)]
pub struct CountingStore {
    pub docs: Vec<Document>,
    /// Reported size; defaults to `docs.len()`.
    pub reported_total: Option<usize>,
    pub similarity_calls: AtomicUsize,
    pub history_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub fail: bool,
}

impl CountingStore {
    pub fn with_docs(docs: Vec<Document>) -> Self {
        Self {
            docs,
            ..Self::default()
        }
    }

    fn check(&self) -> Result<(), RetrievalError> {
        if self.fail {
            Err(RetrievalError::IndexUnavailable("index offline".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl VectorStore for CountingStore {
    async fn describe_index_stats(&self) -> Result<IndexStats, RetrievalError> {
        self.check()?;
        Ok(IndexStats {
            total_record_count: self.reported_total.unwrap_or(self.docs.len()),
        })
    }

    async fn similarity_search(
        &self,
        _query: &str,
        k: usize,
    ) -> Result<Vec<Document>, RetrievalError> {
        self.check()?;
        self.similarity_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.docs.iter().take(k).cloned().collect())
    }

    async fn history_aware_retrieve(
        &self,
        _query: &str,
        _history: &[Turn],
    ) -> Result<Vec<Document>, RetrievalError> {
        self.check()?;
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.docs.clone())
    }

    async fn list_documents(&self, limit: usize) -> Result<Vec<Document>, RetrievalError> {
        self.check()?;
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.docs.iter().take(limit).cloned().collect())
    }
}

/// Answers every completion with a fixed text and records the requests.
pub struct EchoModel {
    pub reply: String,
    pub requests: Mutex<Vec<ProviderRequest>>,
}

impl EchoModel {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.messages[0].content.clone())
            .collect()
    }

    pub fn models(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.model.clone())
            .collect()
    }
}

#[async_trait]
impl Provider for EchoModel {
    fn name(&self) -> &str {
        "echo"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let model = request.model.clone();
        self.requests.lock().unwrap().push(request);
        Ok(ProviderResponse {
            message: Message::assistant(self.reply.clone()),
            usage: None,
            model,
        })
    }
}
