//! Follow-up question rewriting for history-aware retrieval.

use parley_core::error::RetrievalError;
use parley_core::message::{Role, Turn};
use parley_core::provider::ModelHandle;
use tracing::debug;

const REPHRASE_INSTRUCTION: &str = "Rewrite the last user question using the chat history. \
     Return a standalone question in the same language.";

/// Rewrites a follow-up question into a standalone one with a model call.
#[derive(Debug, Clone)]
pub struct QueryRephraser {
    model: ModelHandle,
}

impl QueryRephraser {
    pub fn new(model: ModelHandle) -> Self {
        Self { model }
    }

    /// Returns `query` untouched when there is no conversational context.
    pub async fn rephrase(&self, query: &str, history: &[Turn]) -> Result<String, RetrievalError> {
        let Some(prompt) = build_prompt(query, history) else {
            return Ok(query.to_string());
        };

        let rewritten = self
            .model
            .invoke(prompt)
            .await
            .map_err(|e| RetrievalError::QueryFailed(format!("rephrase: {e}")))?;

        let rewritten = rewritten.trim();
        if rewritten.is_empty() {
            return Ok(query.to_string());
        }

        debug!(original = query, rewritten, "Query rephrased");
        Ok(rewritten.to_string())
    }
}

/// Build the rewrite prompt, or `None` if the history holds no user or
/// assistant turns.
pub fn build_prompt(query: &str, history: &[Turn]) -> Option<String> {
    let lines: Vec<String> = history
        .iter()
        .filter_map(|t| match t.role {
            Role::User => Some(format!("user: {}", t.content)),
            Role::Assistant => Some(format!("assistant: {}", t.content)),
            Role::System | Role::Tool => None,
        })
        .collect();

    if lines.is_empty() {
        return None;
    }

    Some(format!(
        "{REPHRASE_INSTRUCTION}\n\nChat history:\n{}\n\nQuestion: {query}\nStandalone question:",
        lines.join("\n")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_prompt_without_conversation() {
        let history = vec![Turn::system("<REMIXED>")];
        assert!(build_prompt("and in Tokyo?", &history).is_none());
        assert!(build_prompt("and in Tokyo?", &[]).is_none());
    }

    #[test]
    fn prompt_lists_turns_and_skips_markers() {
        let history = vec![
            Turn::system("<REMIXED>"),
            Turn::user("Any Rust jobs?"),
            Turn::assistant("Which location?"),
        ];
        let prompt = build_prompt("Tokyo please", &history).unwrap();
        assert!(prompt.starts_with(REPHRASE_INSTRUCTION));
        assert!(prompt.contains("user: Any Rust jobs?\nassistant: Which location?"));
        assert!(!prompt.contains("<REMIXED>"));
        assert!(prompt.contains("Question: Tokyo please"));
    }
}
