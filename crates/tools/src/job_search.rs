//! Job search tool: thin adapter from tool-call arguments to [`JobRanker`].

use std::sync::Arc;

use async_trait::async_trait;
use parley_core::error::ToolError;
use parley_core::message::Turn;
use parley_core::tool::{Tool, ToolContext, ToolResult, parse_arguments};
use serde::Deserialize;

use crate::ranker::JobRanker;

pub struct JobSearchTool {
    ranker: Arc<JobRanker>,
}

#[derive(Deserialize)]
struct JobSearchArgs {
    query: String,
    #[serde(default)]
    chat_history: Option<Vec<Turn>>,
}

impl JobSearchTool {
    pub fn new(ranker: Arc<JobRanker>) -> Self {
        Self { ranker }
    }
}

#[async_trait]
impl Tool for JobSearchTool {
    fn name(&self) -> &str {
        "job_search"
    }

    fn description(&self) -> &str {
        "Search & rank Zeal job postings."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "What the user is looking for, including location if given"
                },
                "chat_history": {
                    "type": "array",
                    "description": "Earlier turns, used to resolve follow-up questions",
                    "items": {
                        "type": "object",
                        "properties": {
                            "role": { "type": "string", "enum": ["user", "assistant", "system"] },
                            "content": { "type": "string" }
                        },
                        "required": ["role", "content"]
                    }
                }
            },
            "required": ["query"],
            "additionalProperties": false
        })
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
        context: &ToolContext,
    ) -> Result<ToolResult, ToolError> {
        let args: JobSearchArgs = parse_arguments(self.name(), arguments)?;
        let history = args
            .chat_history
            .as_deref()
            .unwrap_or(context.history.as_slice());
        let ranked = self.ranker.rank(&args.query, history).await?;
        Ok(ToolResult::ok(ranked))
    }
}
