//! Tools the orchestrating model can call.
//!
//! Three capabilities: a greeting, an FAQ lookup backed by a TTL cache,
//! and a job search that retrieves and ranks postings.

pub mod faq;
pub mod greeting;
pub mod job_search;
pub mod ranker;

#[cfg(test)]
pub(crate) mod test_helpers;

use std::sync::Arc;

use parley_core::message::Language;
use parley_core::retrieval::VectorStore;
use parley_core::tool::ToolRegistry;

pub use faq::{FAQ_NOT_FOUND, FaqCache, FaqTool};
pub use greeting::{GreetTool, greeting_quick_replies, greeting_text};
pub use job_search::JobSearchTool;
pub use ranker::{JobRanker, clarify_location_message, no_match_message};

/// Registry holding the three built-in tools.
pub fn default_registry(
    language: Language,
    store: Arc<dyn VectorStore>,
    faq_cache: Arc<FaqCache>,
    ranker: Arc<JobRanker>,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(GreetTool::new(language)));
    registry.register(Box::new(FaqTool::new(store, faq_cache)));
    registry.register(Box::new(JobSearchTool::new(ranker)));
    registry
}
