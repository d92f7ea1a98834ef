//! Greeting tool: a fixed, language-selected hello.

use async_trait::async_trait;
use parley_core::error::ToolError;
use parley_core::message::Language;
use parley_core::tool::{Tool, ToolContext, ToolResult};

const GREETING_EN: &str = "Hello! 👋 How can I help you with your job search today?";
const GREETING_JP: &str = "こんにちは！ 👋 どのようなお仕事をお探しですか？";

pub fn greeting_text(language: Language) -> &'static str {
    match language {
        Language::English => GREETING_EN,
        Language::Japanese => GREETING_JP,
    }
}

/// Suggested follow-ups shown under the greeting.
pub fn greeting_quick_replies(language: Language) -> Vec<String> {
    let replies: &[&str] = match language {
        Language::English => &[
            "Jobs in Tokyo",
            "Remote-Japan roles",
            "What does Remote-Japan mean?",
        ],
        Language::Japanese => &[
            "東京の求人",
            "リモート（日本国内）の求人",
            "Remote-Japanとは？",
        ],
    };
    replies.iter().map(|s| s.to_string()).collect()
}

pub struct GreetTool {
    language: Language,
}

impl GreetTool {
    pub fn new(language: Language) -> Self {
        Self { language }
    }
}

#[async_trait]
impl Tool for GreetTool {
    fn name(&self) -> &str {
        "greet_user"
    }

    fn description(&self) -> &str {
        "Return a short greeting."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {},
            "additionalProperties": false
        })
    }

    async fn execute(
        &self,
        _arguments: serde_json::Value,
        _context: &ToolContext,
    ) -> Result<ToolResult, ToolError> {
        Ok(ToolResult::ok(greeting_text(self.language)))
    }
}
