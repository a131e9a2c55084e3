//! Conversation context: the bounded message log an agent run works on.
//!
//! The context owns a fixed system prompt and an ordered list of
//! [`Message`]s. Every append is followed by FIFO eviction down to
//! `max_messages`. Eviction counts raw messages and does not know about
//! tool-call/tool-result pairs, so a small window can leave a tool result
//! whose call has already been dropped (see `eviction_can_split_a_call_from_its_result`).

use uhh_core::message::{Message, MessageToolCall, Role};
use uhh_core::provider::{ContentPart, WireMessage, WireRole};

pub const DEFAULT_MAX_MESSAGES: usize = 50;

#[derive(Debug, Clone)]
pub struct Context {
    system_prompt: String,
    messages: Vec<Message>,
    max_messages: usize,
}

impl Context {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            messages: Vec::new(),
            max_messages: DEFAULT_MAX_MESSAGES,
        }
    }

    /// Set the window size. A bound of zero is raised to one.
    pub fn with_max_messages(mut self, max: usize) -> Self {
        self.max_messages = max.max(1);
        self.evict();
        self
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        self.system_prompt = prompt.into();
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    pub fn add_user_message(&mut self, content: impl Into<String>) {
        self.push(Message::user(content));
    }

    pub fn add_assistant_message(&mut self, content: impl Into<String>) {
        self.push(Message::assistant(content));
    }

    pub fn add_assistant_message_with_tool_calls(
        &mut self,
        content: impl Into<String>,
        tool_calls: Vec<MessageToolCall>,
    ) {
        self.push(Message::assistant_with_tool_calls(content, tool_calls));
    }

    /// Append the result of a tool call.
    ///
    /// The call must belong to the most recent assistant message still in
    /// the window; if that message has been evicted there is nothing left
    /// to check against.
    pub fn add_tool_result(&mut self, tool_call_id: impl Into<String>, content: impl Into<String>) {
        let tool_call_id = tool_call_id.into();
        debug_assert!(
            self.messages
                .iter()
                .rev()
                .find(|m| m.role == Role::Assistant)
                .is_none_or(|m| m.has_tool_call(&tool_call_id)),
            "tool result {tool_call_id} has no matching call in the last assistant message"
        );
        self.push(Message::tool_result(tool_call_id, content));
    }

    /// Translate the log into the wire format the language model consumes.
    pub fn render(&self) -> Vec<WireMessage> {
        let mut out = Vec::with_capacity(self.messages.len() + 1);

        if !self.system_prompt.is_empty() {
            out.push(WireMessage::text(WireRole::System, &self.system_prompt));
        }

        for msg in &self.messages {
            let wire = match msg.role {
                Role::User => WireMessage::text(WireRole::Human, &msg.content),
                Role::Assistant if msg.tool_calls.is_empty() => {
                    WireMessage::text(WireRole::Ai, &msg.content)
                }
                Role::Assistant => {
                    let mut parts = Vec::with_capacity(msg.tool_calls.len() + 1);
                    if !msg.content.is_empty() {
                        parts.push(ContentPart::Text {
                            text: msg.content.clone(),
                        });
                    }
                    parts.extend(msg.tool_calls.iter().map(ContentPart::from));
                    WireMessage {
                        role: WireRole::Ai,
                        parts,
                    }
                }
                Role::Tool => WireMessage {
                    role: WireRole::Tool,
                    parts: vec![ContentPart::ToolResult {
                        tool_call_id: msg.tool_call_id.clone().unwrap_or_default(),
                        content: msg.content.clone(),
                    }],
                },
            };
            out.push(wire);
        }

        out
    }

    /// Drop all messages. The system prompt and window size stay.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.evict();
    }

    fn evict(&mut self) {
        if self.messages.len() > self.max_messages {
            let excess = self.messages.len() - self.max_messages;
            self.messages.drain(..excess);
        }
    }
}
