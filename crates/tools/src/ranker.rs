//! Retrieval-augmented job ranker.
//!
//! Pulls candidate postings from the vector store, insists on a location,
//! and asks a model to pick the best few. The model tier depends on how many
//! candidates survived retrieval, so small jobs run on the cheaper model.

use std::sync::Arc;

use parley_config::RankerConfig;
use parley_core::error::ToolError;
use parley_core::message::{Language, Turn};
use parley_core::provider::ModelHandle;
use parley_core::retrieval::{Document, VectorStore};
use tracing::{debug, info};

const CLARIFY_LOCATION_EN: &str =
    "Do you have a preferred location? Openings: Tokyo / Remote-Japan.";
const CLARIFY_LOCATION_JP: &str = "ご希望の勤務地はありますか？ 募集中：東京 / Remote-Japan";

const NO_MATCH_EN: &str =
    "Nothing matches that right now. Want me to ping you when something suitable appears?";
const NO_MATCH_JP: &str =
    "現在ご希望に合う求人はありません。条件に合う求人が出たらお知らせしましょうか？";

/// Asked when the query names no known location.
pub fn clarify_location_message(language: Language) -> &'static str {
    match language {
        Language::English => CLARIFY_LOCATION_EN,
        Language::Japanese => CLARIFY_LOCATION_JP,
    }
}

/// Returned when no posting mentions the requested location.
pub fn no_match_message(language: Language) -> &'static str {
    match language {
        Language::English => NO_MATCH_EN,
        Language::Japanese => NO_MATCH_JP,
    }
}

pub struct JobRanker {
    store: Arc<dyn VectorStore>,
    fast: ModelHandle,
    pro: ModelHandle,
    config: RankerConfig,
    language: Language,
    /// Lowercased copy of `config.location_terms`.
    location_terms: Vec<String>,
}

impl JobRanker {
    pub fn new(
        store: Arc<dyn VectorStore>,
        fast: ModelHandle,
        pro: ModelHandle,
        config: RankerConfig,
    ) -> Self {
        let location_terms = config
            .location_terms
            .iter()
            .map(|t| t.to_lowercase())
            .collect();
        Self {
            store,
            fast,
            pro,
            config,
            language: Language::default(),
            location_terms,
        }
    }

    /// Language of the fixed clarification and no-match replies.
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Rank postings for `query`. Returns the model's answer verbatim, or one
    /// of the fixed clarification / no-match replies.
    pub async fn rank(&self, query: &str, history: &[Turn]) -> Result<String, ToolError> {
        let stats = self.store.describe_index_stats().await?;
        let docs = if stats.total_record_count <= self.config.small_corpus_limit {
            debug!(total = stats.total_record_count, "Small corpus, reading it whole");
            self.store
                .list_documents(self.config.small_corpus_limit)
                .await?
        } else {
            self.store.history_aware_retrieve(query, history).await?
        };

        let wanted = self.locations_in(query);
        if wanted.is_empty() {
            return Ok(clarify_location_message(self.language).to_string());
        }

        let candidates: Vec<Document> = docs
            .into_iter()
            .filter(|d| mentions_any(d, &wanted))
            .collect();
        if candidates.is_empty() {
            return Ok(no_match_message(self.language).to_string());
        }

        let model = if candidates.len() <= self.config.fast_tier_max {
            &self.fast
        } else {
            &self.pro
        };
        info!(
            candidates = candidates.len(),
            model = model.model(),
            "Ranking job postings"
        );

        let jobs = self.format_candidates(&candidates);
        let ranked = model.invoke(rank_prompt(query, &jobs)).await?;
        Ok(ranked)
    }

    fn locations_in<'a>(&'a self, query: &str) -> Vec<&'a str> {
        let query = query.to_lowercase();
        self.location_terms
            .iter()
            .filter(|t| query.contains(t.as_str()))
            .map(|t| t.as_str())
            .collect()
    }

    fn format_candidates(&self, candidates: &[Document]) -> String {
        candidates
            .iter()
            .take(self.config.max_candidates)
            .enumerate()
            .map(|(i, d)| {
                format!(
                    "{}. {} | {}\n{}",
                    i + 1,
                    d.meta_str("title").unwrap_or("Untitled"),
                    d.meta_str("location").unwrap_or("Unspecified"),
                    excerpt(&d.page_content, self.config.excerpt_chars)
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

fn mentions_any(doc: &Document, terms: &[&str]) -> bool {
    let location = doc.meta_str("location").unwrap_or_default().to_lowercase();
    let content = doc.page_content.to_lowercase();
    terms
        .iter()
        .any(|t| location.contains(t) || content.contains(t))
}

/// Cut `text` to at most `max_chars` characters, marking the cut with `…`.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}

fn rank_prompt(query: &str, jobs: &str) -> String {
    format!(
        "You are a helpful recruiter. **Do NOT output citations, IDs, or tool tags.**\n\
         Rank the jobs below for the user query: \"{query}\".\n\
         Return up to 3 markdown bullets, each with a 1-sentence reason.\n\
         \n\
         ---\n\
         {jobs}"
    )
}
