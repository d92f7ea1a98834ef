//! The orchestration session: one `chat` call from raw message to reply.
//!
//! Each call moves through `Idle → Gating → Windowing → Dispatching →
//! Sanitizing → Idle`. The gate may answer directly from `Gating`. Every
//! reply, canned or generated, is sanitized exactly once on the way out.
//!
//! Nothing persists between calls except the safety ledger's counters and
//! the FAQ cache held by the tools.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use parley_config::WindowConfig;
use parley_core::error::{Result, ToolError};
use parley_core::event::{DomainEvent, EventBus, ShortCircuit};
use parley_core::message::{ChatReply, Language, Message, MessageToolCall, Turn};
use parley_core::provider::ModelHandle;
use parley_core::tool::{ToolCall, ToolContext, ToolRegistry};
use parley_security::{
    GateDecision, LOCKOUT_MESSAGE, SafetyGate, UNSAFE_INPUT_MESSAGE, sanitize_output,
};
use parley_tools::{greeting_quick_replies, greeting_text};
use tracing::{debug, info, warn};

use crate::context::build_window;
use crate::prompt::{PromptMode, PromptSource};

/// Session id used when the caller does not supply one.
pub const DEFAULT_SESSION: &str = "anon";

const MAX_ITERATIONS_MESSAGE: &str =
    "I've reached the maximum number of tool call iterations. Please provide further guidance.";

const PREVIEW_CHARS: usize = 50;

/// Pipeline stage of a `chat` call, logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Gating,
    Windowing,
    Dispatching,
    Sanitizing,
}

pub struct ChatEngine {
    gate: SafetyGate,
    tools: ToolRegistry,
    /// Pro-tier model that picks tools and writes the final answer.
    orchestrator: ModelHandle,
    prompts: Arc<dyn PromptSource>,
    language: Language,
    window: WindowConfig,
    max_iterations: usize,
    events: Arc<EventBus>,
}

impl ChatEngine {
    pub fn new(
        gate: SafetyGate,
        tools: ToolRegistry,
        orchestrator: ModelHandle,
        prompts: Arc<dyn PromptSource>,
    ) -> Self {
        Self {
            gate,
            tools,
            orchestrator,
            prompts,
            language: Language::default(),
            window: WindowConfig::default(),
            max_iterations: 6,
            events: Arc::new(EventBus::default()),
        }
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn with_window(mut self, window: WindowConfig) -> Self {
        self.window = window;
        self
    }

    /// Cap on model round-trips per call.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_event_bus(mut self, events: Arc<EventBus>) -> Self {
        self.events = events;
        self
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.names()
    }

    /// Answer `message` and return only the reply text.
    pub async fn chat(&self, message: &str, history: &[Turn], session_id: &str) -> Result<String> {
        Ok(self.chat_reply(message, history, session_id).await?.response)
    }

    /// Answer `message`. Upstream failures (model, retrieval, prompt
    /// loading) propagate; rejected input, lockouts, clarifying questions
    /// and empty results are ordinary replies.
    pub async fn chat_reply(
        &self,
        message: &str,
        history: &[Turn],
        session_id: &str,
    ) -> Result<ChatReply> {
        let session_id = if session_id.is_empty() {
            DEFAULT_SESSION
        } else {
            session_id
        };
        self.events.publish(DomainEvent::MessageReceived {
            session_id: session_id.to_string(),
            content_preview: message.chars().take(PREVIEW_CHARS).collect(),
            timestamp: Utc::now(),
        });

        self.enter(Stage::Gating, session_id);
        match self.gate.inspect(message, session_id) {
            GateDecision::Greeting => {
                let mut reply = self.short_circuit(
                    greeting_text(self.language),
                    ShortCircuit::Greeting,
                    session_id,
                );
                reply.quick_replies = Some(greeting_quick_replies(self.language));
                return Ok(reply);
            }
            GateDecision::Rejected => {
                return Ok(self.short_circuit(
                    UNSAFE_INPUT_MESSAGE,
                    ShortCircuit::InputRejected,
                    session_id,
                ));
            }
            GateDecision::Locked { hits, flagged } => {
                if flagged {
                    self.abuse_detected(session_id, hits);
                }
                return Ok(self.short_circuit(LOCKOUT_MESSAGE, ShortCircuit::Locked, session_id));
            }
            GateDecision::Proceed { flagged } => {
                if let Some(hits) = flagged {
                    self.abuse_detected(session_id, hits);
                }
            }
        }

        self.enter(Stage::Windowing, session_id);
        let window = build_window(history, &self.window.marker, self.window.budget);
        debug!(session_id, turns = window.len() - 1, "History windowed");

        self.enter(Stage::Dispatching, session_id);
        let raw = self.dispatch(message, window, session_id).await?;

        self.enter(Stage::Sanitizing, session_id);
        let response = sanitize_output(&raw);

        self.enter(Stage::Idle, session_id);
        Ok(ChatReply::text(response))
    }

    /// Run the tool-calling loop against the orchestrating model.
    async fn dispatch(&self, message: &str, window: Vec<Turn>, session_id: &str) -> Result<String> {
        let system_prompt = self.prompts.load(self.language, PromptMode::System).await?;

        let mut messages = Vec::with_capacity(window.len() + 2);
        messages.push(Message::system(system_prompt));
        messages.extend(window.iter().map(Message::from));
        messages.push(Message::user(message));

        let definitions = self.tools.definitions();
        let context = ToolContext {
            session_id: session_id.to_string(),
            history: window,
        };
        let mut tokens_used = 0;

        for iteration in 1..=self.max_iterations {
            debug!(session_id, iteration, "Orchestration round");

            let response = self
                .orchestrator
                .complete(messages.clone(), definitions.clone())
                .await?;
            if let Some(usage) = &response.usage {
                tokens_used += usage.total_tokens;
            }

            if response.message.tool_calls.is_empty() {
                info!(
                    session_id,
                    model = %response.model,
                    tokens_used,
                    iterations = iteration,
                    "Response generated"
                );
                self.events.publish(DomainEvent::ResponseGenerated {
                    session_id: session_id.to_string(),
                    model: response.model,
                    tokens_used,
                    timestamp: Utc::now(),
                });
                return Ok(response.message.content);
            }

            let calls = response.message.tool_calls.clone();
            messages.push(response.message);
            for call in &calls {
                let output = self.run_tool(call, &context).await?;
                messages.push(Message::tool_result(&call.id, output));
            }
        }

        warn!(
            session_id,
            max_iterations = self.max_iterations,
            "Max tool iterations reached, forcing text response"
        );
        Ok(MAX_ITERATIONS_MESSAGE.to_string())
    }

    /// Execute one tool call. Argument problems are reported back to the
    /// model as the tool's output; anything else ends the `chat` call.
    async fn run_tool(&self, call: &MessageToolCall, context: &ToolContext) -> Result<String> {
        let arguments = if call.arguments.trim().is_empty() {
            Ok(serde_json::json!({}))
        } else {
            serde_json::from_str(&call.arguments).map_err(|e| {
                ToolError::InvalidArguments(format!("arguments are not valid JSON: {e}"))
            })
        };

        let start = Instant::now();
        let result = match arguments {
            Ok(arguments) => {
                let tool_call = ToolCall {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    arguments,
                };
                self.tools.execute(&tool_call, context).await
            }
            Err(e) => Err(e),
        };
        let duration_ms = start.elapsed().as_millis() as u64;

        let (success, outcome) = match result {
            Ok(result) => (result.success, Ok(result.output)),
            Err(e) if e.is_recoverable() => {
                warn!(tool = %call.name, error = %e, "Tool call rejected");
                (false, Ok(format!("Error: {e}")))
            }
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Tool execution failed");
                (false, Err(e.into()))
            }
        };

        debug!(tool = %call.name, success, duration_ms, "Tool executed");
        self.events.publish(DomainEvent::ToolExecuted {
            session_id: context.session_id.clone(),
            tool_name: call.name.clone(),
            success,
            duration_ms,
            timestamp: Utc::now(),
        });
        outcome
    }

    fn short_circuit(&self, text: &str, reason: ShortCircuit, session_id: &str) -> ChatReply {
        info!(session_id, reason = ?reason, "Short-circuited");
        self.events.publish(DomainEvent::ShortCircuited {
            session_id: session_id.to_string(),
            reason,
            timestamp: Utc::now(),
        });
        self.enter(Stage::Sanitizing, session_id);
        let reply = ChatReply::text(sanitize_output(text));
        self.enter(Stage::Idle, session_id);
        reply
    }

    fn abuse_detected(&self, session_id: &str, hits: u32) {
        self.events.publish(DomainEvent::AbuseDetected {
            session_id: session_id.to_string(),
            hits,
            timestamp: Utc::now(),
        });
    }

    fn enter(&self, stage: Stage, session_id: &str) {
        debug!(session_id, stage = ?stage, "Stage");
    }
}

impl std::fmt::Debug for ChatEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatEngine")
            .field("orchestrator", &self.orchestrator)
            .field("language", &self.language)
            .field("tools", &self.tools.names())
            .field("max_iterations", &self.max_iterations)
            .finish()
    }
}
