//! Provider trait: the abstraction over the language model service.
//!
//! A Provider turns a rendered message list plus a tool schema into a
//! response holding one or more choices. Each choice carries free text,
//! structured tool-call requests, or both.
//!
//! Transport, authentication, and retry policy belong to the implementation;
//! the agent loop never retries a failed call.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::MessageToolCall;

/// Role of a message on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireRole {
    System,
    Human,
    Ai,
    Tool,
}

/// One part of a wire message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text {
        text: String,
    },
    ToolCall {
        id: String,
        name: String,
        arguments: String,
    },
    ToolResult {
        tool_call_id: String,
        content: String,
    },
}

impl From<&MessageToolCall> for ContentPart {
    fn from(tc: &MessageToolCall) -> Self {
        ContentPart::ToolCall {
            id: tc.id.clone(),
            name: tc.name.clone(),
            arguments: tc.arguments.clone(),
        }
    }
}

/// A message in the format the language model service consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: WireRole,
    pub parts: Vec<ContentPart>,
}

impl WireMessage {
    /// A message made of a single text part.
    pub fn text(role: WireRole, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![ContentPart::Text { text: text.into() }],
        }
    }

    /// Concatenated text parts of this message.
    pub fn text_content(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                ContentPart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

/// A tool definition sent to the LLM so it knows what tools it can call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// Per-call generation options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Override the provider's configured model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_temperature() -> f32 {
    0.7
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            model: None,
            temperature: default_temperature(),
            max_tokens: None,
        }
    }
}

/// A request to the language model service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub messages: Vec<WireMessage>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,

    #[serde(default)]
    pub options: GenerateOptions,
}

/// One candidate answer from the service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Choice {
    /// Free text (may be empty)
    #[serde(default)]
    pub content: String,

    /// Requested tool invocations, in the order the model emitted them
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<MessageToolCall>,

    /// Service-reported reason for stopping ("stop", "end_turn", "tool_calls", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
}

impl Choice {
    /// A plain text choice that ended normally.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
            stop_reason: Some("stop".into()),
        }
    }

    /// A choice that only requests tool calls.
    pub fn tool_calls(tool_calls: Vec<MessageToolCall>) -> Self {
        Self {
            content: String::new(),
            tool_calls,
            stop_reason: Some("tool_calls".into()),
        }
    }

    /// Whether the service signalled an explicit end of turn.
    pub fn is_end_of_turn(&self) -> bool {
        matches!(self.stop_reason.as_deref(), Some("stop") | Some("end_turn"))
    }
}

/// A complete response from the service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub choices: Vec<Choice>,
}

/// The core Provider trait.
///
/// Every LLM backend implements this trait. The agent loop calls
/// `generate()` without knowing which backend is behind it.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A short identifier for this provider (e.g., "openai", "deepseek").
    fn name(&self) -> &str;

    /// Whether the backend accepts a tool schema and returns tool calls.
    fn supports_tool_calling(&self) -> bool {
        true
    }

    /// Send a message list with a tool schema and get the choices back.
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, ProviderError>;

    /// Single-prompt text completion, used outside agent mode.
    ///
    /// Default implementation sends the prompt as one human message and
    /// returns the first choice's text.
    async fn complete(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<String, ProviderError> {
        let response = self
            .generate(GenerateRequest {
                messages: vec![WireMessage::text(WireRole::Human, prompt)],
                tools: Vec::new(),
                options: options.clone(),
            })
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.content)
            .ok_or_else(|| ProviderError::ApiError {
                status_code: 200,
                message: "No choices in response".into(),
            })
    }

    /// List available models for this provider.
    async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoProvider;

    #[async_trait]
    impl Provider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate(
            &self,
            request: GenerateRequest,
        ) -> Result<GenerateResponse, ProviderError> {
            let text = request
                .messages
                .last()
                .map(|m| m.text_content())
                .unwrap_or_default();
            Ok(GenerateResponse {
                choices: vec![Choice::text(text)],
            })
        }
    }

    #[tokio::test]
    async fn complete_defaults_to_generate() {
        let provider = EchoProvider;
        let text = provider
            .complete("rename all jpgs", &GenerateOptions::default())
            .await
            .unwrap();
        assert_eq!(text, "rename all jpgs");
    }

    #[test]
    fn end_of_turn_detection() {
        assert!(Choice::text("").is_end_of_turn());
        let mut choice = Choice::default();
        assert!(!choice.is_end_of_turn());
        choice.stop_reason = Some("end_turn".into());
        assert!(choice.is_end_of_turn());
        choice.stop_reason = Some("length".into());
        assert!(!choice.is_end_of_turn());
    }

    #[test]
    fn content_part_serialization_is_tagged() {
        let part = ContentPart::ToolResult {
            tool_call_id: "call_1".into(),
            content: "ok".into(),
        };
        let json = serde_json::to_value(&part).unwrap();
        assert_eq!(json["type"], "tool_result");
        assert_eq!(json["tool_call_id"], "call_1");
    }

    #[test]
    fn default_options() {
        let opts = GenerateOptions::default();
        assert!((opts.temperature - 0.7).abs() < f32::EPSILON);
        assert!(opts.model.is_none());
    }
}
