//! Tool trait: the capabilities the orchestration model may call.
//!
//! The model picks which tool to call; the registry is the boundary where
//! its choice is checked. Arguments are validated against the tool's
//! declared JSON schema before the handler runs, and each handler then
//! decodes them into its own typed argument struct.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ToolError;
use crate::message::Turn;
use crate::provider::ToolDefinition;

/// A request to execute a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique call ID (matches the LLM's tool_call.id)
    pub id: String,

    /// Name of the tool to execute
    pub name: String,

    /// Arguments as a JSON value
    pub arguments: serde_json::Value,
}

/// The result of a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// The call ID this result is for
    pub call_id: String,

    /// Whether the tool executed successfully
    pub success: bool,

    /// The output content
    pub output: String,
}

impl ToolResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            call_id: String::new(),
            success: true,
            output: output.into(),
        }
    }
}

/// Per-call context handed to every tool.
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    /// Session the current `chat` call belongs to.
    pub session_id: String,

    /// The windowed conversation for this call (marker turn first).
    pub history: Vec<Turn>,
}

/// The core Tool trait.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "faq_lookup").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with already-validated arguments.
    async fn execute(
        &self,
        arguments: serde_json::Value,
        context: &ToolContext,
    ) -> std::result::Result<ToolResult, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the LLM.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// Decode validated arguments into a tool's typed input.
pub fn parse_arguments<T: DeserializeOwned>(
    tool_name: &str,
    arguments: serde_json::Value,
) -> std::result::Result<T, ToolError> {
    serde_json::from_value(arguments)
        .map_err(|e| ToolError::InvalidArguments(format!("{tool_name}: {e}")))
}

/// Check `arguments` against the subset of JSON Schema the tools declare:
/// object type, `required`, primitive property `type`s, and
/// `additionalProperties: false`.
pub fn validate_arguments(
    schema: &serde_json::Value,
    arguments: &serde_json::Value,
) -> std::result::Result<(), ToolError> {
    let Some(args) = arguments.as_object() else {
        return Err(ToolError::InvalidArguments(
            "arguments must be a JSON object".into(),
        ));
    };

    let properties = schema.get("properties").and_then(|p| p.as_object());

    if let Some(required) = schema.get("required").and_then(|r| r.as_array()) {
        for key in required.iter().filter_map(|k| k.as_str()) {
            if !args.contains_key(key) {
                return Err(ToolError::InvalidArguments(format!(
                    "missing required field '{key}'"
                )));
            }
        }
    }

    let closed = schema
        .get("additionalProperties")
        .and_then(|a| a.as_bool())
        == Some(false);

    for (key, value) in args {
        let declared = properties.and_then(|p| p.get(key));
        match declared {
            Some(prop) => {
                if let Some(expected) = prop.get("type").and_then(|t| t.as_str()) {
                    if !matches_type(expected, value) {
                        return Err(ToolError::InvalidArguments(format!(
                            "field '{key}' must be of type {expected}"
                        )));
                    }
                }
            }
            None if closed => {
                return Err(ToolError::InvalidArguments(format!(
                    "unexpected field '{key}'"
                )));
            }
            None => {}
        }
    }

    Ok(())
}

fn matches_type(expected: &str, value: &serde_json::Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => true,
    }
}

/// A registry of available tools, fixed once the engine is built.
///
/// Backed by a `BTreeMap` so definitions are always listed in the same
/// order.
pub struct ToolRegistry {
    tools: BTreeMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// Get all tool definitions (for sending to the LLM).
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.to_definition()).collect()
    }

    /// Validate and execute a tool call.
    pub async fn execute(
        &self,
        call: &ToolCall,
        context: &ToolContext,
    ) -> std::result::Result<ToolResult, ToolError> {
        let tool = self
            .tools
            .get(&call.name)
            .ok_or_else(|| ToolError::NotFound(call.name.clone()))?;

        validate_arguments(&tool.parameters_schema(), &call.arguments)?;

        let mut result = tool.execute(call.arguments.clone(), context).await?;
        result.call_id = call.id.clone();
        Ok(result)
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A simple test tool for unit tests.
    struct EchoTool;

    #[derive(Deserialize)]
    struct EchoArgs {
        text: String,
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echoes back the input"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "text": { "type": "string" },
                    "times": { "type": "integer" }
                },
                "required": ["text"],
                "additionalProperties": false
            })
        }
        async fn execute(
            &self,
            arguments: serde_json::Value,
            context: &ToolContext,
        ) -> std::result::Result<ToolResult, ToolError> {
            let args: EchoArgs = parse_arguments(self.name(), arguments)?;
            Ok(ToolResult::ok(format!("{}:{}", context.session_id, args.text)))
        }
    }

    fn call(args: serde_json::Value) -> ToolCall {
        ToolCall {
            id: "call_1".into(),
            name: "echo".into(),
            arguments: args,
        }
    }

    fn ctx() -> ToolContext {
        ToolContext {
            session_id: "s1".into(),
            history: vec![],
        }
    }

    #[test]
    fn registry_register_and_lookup() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));
        assert!(registry.get("echo").is_some());
        assert!(registry.get("nonexistent").is_none());
        assert_eq!(registry.names(), vec!["echo"]);
        assert_eq!(registry.definitions()[0].name, "echo");
    }

    #[tokio::test]
    async fn registry_execute_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));

        let result = registry
            .execute(&call(serde_json::json!({"text": "hello"})), &ctx())
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.output, "s1:hello");
        assert_eq!(result.call_id, "call_1");
    }

    #[tokio::test]
    async fn registry_execute_missing_tool() {
        let registry = ToolRegistry::new();
        let err = registry
            .execute(&call(serde_json::json!({})), &ctx())
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[tokio::test]
    async fn schema_rejects_missing_required_field() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));
        let err = registry
            .execute(&call(serde_json::json!({"times": 2})), &ctx())
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(ref m) if m.contains("text")));
    }

    #[test]
    fn schema_rejects_wrong_type_and_unknown_field() {
        let schema = EchoTool.parameters_schema();
        assert!(validate_arguments(&schema, &serde_json::json!({"text": 5})).is_err());
        assert!(
            validate_arguments(&schema, &serde_json::json!({"text": "a", "extra": true}))
                .is_err()
        );
        assert!(validate_arguments(&schema, &serde_json::json!("text")).is_err());
        assert!(validate_arguments(&schema, &serde_json::json!({"text": "a", "times": 3})).is_ok());
    }

    #[test]
    fn open_schema_tolerates_extra_fields() {
        let schema = serde_json::json!({
            "type": "object",
            "properties": { "query": { "type": "string" } },
            "required": ["query"]
        });
        assert!(validate_arguments(&schema, &serde_json::json!({"query": "q", "k": 1})).is_ok());
    }
}
