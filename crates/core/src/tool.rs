//! Tool trait: the abstraction over agent capabilities.
//!
//! Tools are what give the agent the ability to act in the world:
//! execute shell commands, read and write files. Each tool carries a
//! safety level and says whether a human must approve it before it runs.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ToolError;
use crate::provider::ToolDefinition;

/// How much damage a tool can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafetyLevel {
    /// Read-only, no side effects
    Safe,
    /// Modifies files
    Moderate,
    /// Executes arbitrary commands
    Dangerous,
}

impl std::fmt::Display for SafetyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SafetyLevel::Safe => "safe",
            SafetyLevel::Moderate => "moderate",
            SafetyLevel::Dangerous => "dangerous",
        };
        f.write_str(s)
    }
}

/// Input handed to a tool.
#[derive(Debug, Clone, Default)]
pub struct ToolInput {
    /// Raw argument text as the model produced it
    pub raw: String,

    /// `raw` parsed as JSON, if it parses
    pub parsed: Option<serde_json::Value>,

    /// Directory relative paths resolve against (process cwd when absent)
    pub working_dir: Option<PathBuf>,
}

impl ToolInput {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let parsed = serde_json::from_str(&raw).ok();
        Self {
            raw,
            parsed,
            working_dir: None,
        }
    }

    pub fn with_working_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.working_dir = dir;
        self
    }

    /// A string field of the parsed JSON object, if present.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.parsed.as_ref()?.get(key)?.as_str()
    }
}

/// The result of a tool execution that ran to completion.
///
/// `success == false` means the tool ran but reported failure (e.g. a
/// command exited non-zero); `output` then holds whatever partial output
/// was produced and `error` the failure text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the tool executed successfully
    pub success: bool,

    /// The output content
    pub output: String,

    /// Failure text when `success` is false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
        }
    }

    pub fn failed(output: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
            error: Some(error.into()),
        }
    }
}

/// The core Tool trait.
///
/// Tools are immutable after construction; any configuration (timeouts,
/// size caps) is fixed when the tool is built.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "bash", "file_read").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Whether a human must approve each call.
    fn requires_confirmation(&self) -> bool;

    fn safety_level(&self) -> SafetyLevel;

    /// Human-readable summary of a call, shown by the confirmation gate.
    fn describe(&self, _raw_arguments: &str) -> String {
        format!("Execute {} tool", self.name())
    }

    /// Execute the tool with the given input.
    async fn execute(&self, input: ToolInput) -> Result<ToolResult, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the LLM.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// A thread-safe registry of available tools.
///
/// Shared across concurrent agent runs behind an `Arc`; registration is
/// rare, lookups are frequent, hence the read/write lock.
pub struct ToolRegistry {
    tools: RwLock<HashMap<String, Arc<dyn Tool>>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: RwLock::new(HashMap::new()),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Tool>, ToolError> {
        self.tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| ToolError::NotFound(name.to_string()))
    }

    pub fn has(&self, name: &str) -> bool {
        self.tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// All registered tools, ordered by name.
    pub fn all(&self) -> Vec<Arc<dyn Tool>> {
        let mut tools: Vec<_> = self
            .tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        tools.sort_by(|a, b| a.name().cmp(b.name()));
        tools
    }

    /// List all registered tool names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self
            .tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// The registered tools whose names appear in `names`, ordered by name.
    /// Unknown names are ignored.
    pub fn filter_by_names<S: AsRef<str>>(&self, names: &[S]) -> Vec<Arc<dyn Tool>> {
        self.all()
            .into_iter()
            .filter(|t| names.iter().any(|n| n.as_ref() == t.name()))
            .collect()
    }

    /// Get all tool definitions (for sending to the LLM).
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.all().iter().map(|t| t.to_definition()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
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
    struct EchoTool {
        name: &'static str,
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            self.name
        }
        fn description(&self) -> &str {
            "Echoes back the input"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "text": { "type": "string" }
                },
                "required": ["text"]
            })
        }
        fn requires_confirmation(&self) -> bool {
            false
        }
        fn safety_level(&self) -> SafetyLevel {
            SafetyLevel::Safe
        }
        async fn execute(&self, input: ToolInput) -> Result<ToolResult, ToolError> {
            Ok(ToolResult::ok(input.str_field("text").unwrap_or("")))
        }
    }

    fn echo(name: &'static str) -> Arc<dyn Tool> {
        Arc::new(EchoTool { name })
    }

    #[test]
    fn registry_register_and_lookup() {
        let registry = ToolRegistry::new();
        registry.register(echo("echo"));
        assert!(registry.get("echo").is_ok());
        assert!(registry.has("echo"));
        let err = registry.get("nonexistent").err().unwrap();
        assert!(matches!(err, ToolError::NotFound(ref n) if n == "nonexistent"));
    }

    #[test]
    fn register_replaces_by_name() {
        let registry = ToolRegistry::new();
        registry.register(echo("echo"));
        registry.register(echo("echo"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn names_and_all_are_sorted() {
        let registry = ToolRegistry::new();
        registry.register(echo("file_write"));
        registry.register(echo("bash"));
        registry.register(echo("file_read"));
        assert_eq!(registry.names(), vec!["bash", "file_read", "file_write"]);
        let all: Vec<_> = registry.all().iter().map(|t| t.name().to_string()).collect();
        assert_eq!(all, registry.names());
    }

    #[test]
    fn filter_by_names_is_an_intersection() {
        let registry = ToolRegistry::new();
        registry.register(echo("bash"));
        registry.register(echo("file_read"));
        let filtered = registry.filter_by_names(&["file_read", "teleport"]);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name(), "file_read");
        assert!(registry.filter_by_names::<&str>(&[]).is_empty());
    }

    #[test]
    fn registry_definitions() {
        let registry = ToolRegistry::new();
        registry.register(echo("echo"));
        let defs = registry.definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "echo");
        assert_eq!(defs[0].parameters["required"], serde_json::json!(["text"]));
    }

    #[tokio::test]
    async fn registry_is_shareable_across_tasks() {
        let registry = Arc::new(ToolRegistry::new());
        registry.register(echo("echo"));

        let mut handles = Vec::new();
        for i in 0..8 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                if i == 0 {
                    registry.register(echo("late"));
                }
                let tool = registry.get("echo").unwrap();
                tool.execute(ToolInput::new(r#"{"text":"hi"}"#)).await.unwrap()
            }));
        }
        for h in handles {
            assert_eq!(h.await.unwrap().output, "hi");
        }
        assert!(registry.has("late"));
    }

    #[test]
    fn tool_input_parses_json_when_possible() {
        let input = ToolInput::new(r#"{"path":"a.txt"}"#);
        assert_eq!(input.str_field("path"), Some("a.txt"));

        let input = ToolInput::new("ls -la");
        assert!(input.parsed.is_none());
        assert_eq!(input.str_field("path"), None);
    }

    #[test]
    fn default_describe_names_the_tool() {
        assert_eq!(echo("echo").describe("{}"), "Execute echo tool");
    }

    #[test]
    fn safety_level_display() {
        assert_eq!(SafetyLevel::Dangerous.to_string(), "dangerous");
        assert!(SafetyLevel::Safe < SafetyLevel::Moderate);
    }
}
