//! Wiring: builds a [`ChatEngine`] and its collaborators from [`AppConfig`].

use std::sync::Arc;

use parley_config::AppConfig;
use parley_core::error::{Error, Result};
use parley_core::retrieval::VectorStore;
use parley_providers::{ModelSet, build_from_config};
use parley_retrieval::{Embedder, InMemoryVectorStore, QueryRephraser, load_corpus};
use parley_security::SafetyGate;
use parley_tools::{FaqCache, JobRanker, default_registry};
use tracing::{info, warn};

use crate::engine::ChatEngine;
use crate::prompt::{BuiltinPromptSource, FilePromptSource, PromptSource};

/// Build the engine end to end: providers, corpus, cache and tools.
///
/// Must run inside a Tokio runtime when a cache sweep interval is set.
pub async fn build_engine(config: &AppConfig) -> Result<ChatEngine> {
    config.validate().map_err(|e| Error::Config {
        message: e.to_string(),
    })?;

    let models = build_from_config(config);
    let store = build_store(config, &models).await?;

    let faq_cache = Arc::new(FaqCache::new(config.cache.faq_ttl()));
    if let Some(every) = config.cache.sweep_interval() {
        FaqCache::spawn_sweeper(&faq_cache, every);
        info!(every_secs = every.as_secs(), "FAQ cache sweeper started");
    }

    Ok(assemble(config, &models, store, faq_cache))
}

/// Create the in-memory store and index the configured corpus, if any.
pub async fn build_store(
    config: &AppConfig,
    models: &ModelSet,
) -> Result<Arc<InMemoryVectorStore>> {
    let mut store = InMemoryVectorStore::new()
        .with_rephraser(QueryRephraser::new(models.fast.clone()))
        .with_retrieval_k(config.ranker.retrieval_k);
    if let Some(model) = &models.embedding {
        store = store.with_embedder(Embedder::new(models.provider(), model));
    }

    match &config.corpus_path {
        Some(path) => {
            let documents = load_corpus(path).await?;
            let indexed = store.add_documents(documents).await?;
            info!(indexed, embeddings = models.embedding.is_some(), "Corpus indexed");
        }
        None => warn!("No corpus configured; job search and FAQ fallback will find nothing"),
    }

    Ok(Arc::new(store))
}

/// Wire the gate, tools and prompts around an existing store.
pub fn assemble(
    config: &AppConfig,
    models: &ModelSet,
    store: Arc<dyn VectorStore>,
    faq_cache: Arc<FaqCache>,
) -> ChatEngine {
    let language = config.language();
    let ranker = JobRanker::new(
        store.clone(),
        models.fast.clone(),
        models.pro.clone(),
        config.ranker.clone(),
    )
    .with_language(language);
    let tools = default_registry(language, store, faq_cache, Arc::new(ranker));

    ChatEngine::new(
        SafetyGate::from_config(&config.safety),
        tools,
        models.pro.clone(),
        prompt_source(config),
    )
    .with_language(language)
    .with_window(config.window.clone())
    .with_max_iterations(config.agent.max_iterations)
}

fn prompt_source(config: &AppConfig) -> Arc<dyn PromptSource> {
    match &config.prompts.dir {
        Some(dir) => Arc::new(FilePromptSource::new(dir)),
        None => Arc::new(BuiltinPromptSource),
    }
}
