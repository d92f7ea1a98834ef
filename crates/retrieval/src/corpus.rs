//! Corpus loading from JSON files.
//!
//! Accepts either a bare array of documents or an object with a
//! `documents` array. Each document is `{ "pageContent": ..., "metadata": {...} }`.

use std::path::Path;

use parley_core::error::RetrievalError;
use parley_core::retrieval::Document;
use serde::Deserialize;
use tracing::info;

#[derive(Deserialize)]
#[serde(untagged)]
enum CorpusFile {
    Bare(Vec<Document>),
    Wrapped { documents: Vec<Document> },
}

/// Parse a corpus from a JSON string.
pub fn parse_corpus(json: &str) -> Result<Vec<Document>, RetrievalError> {
    let file: CorpusFile =
        serde_json::from_str(json).map_err(|e| RetrievalError::CorpusLoad(e.to_string()))?;
    Ok(match file {
        CorpusFile::Bare(documents) | CorpusFile::Wrapped { documents } => documents,
    })
}

/// Read and parse a corpus file.
pub async fn load_corpus(path: &Path) -> Result<Vec<Document>, RetrievalError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| RetrievalError::CorpusLoad(format!("{}: {e}", path.display())))?;
    let documents = parse_corpus(&content)?;
    info!(path = %path.display(), count = documents.len(), "Corpus loaded");
    Ok(documents)
}
