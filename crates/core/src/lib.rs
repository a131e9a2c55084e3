//! # uhh Core
//!
//! Domain types, traits, and error definitions for the uhh terminal agent.
//! This crate has **zero framework dependencies**: it defines the domain model
//! that the tool, provider, and agent crates implement against.
//!
//! ## Design Philosophy
//!
//! Every seam of the agent is a trait here:
//! - [`Provider`] is the language model service the agent loop talks to
//! - [`Tool`] is a side-effecting capability the model may invoke
//! - [`ConfirmationGate`] is the human checkpoint in front of risky tools
//!
//! Implementations live in their respective crates, so tests can substitute
//! scripted providers and fake gates without touching the network or a TTY.

pub mod confirm;
pub mod error;
pub mod event;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use confirm::{AutoApprove, ConfirmationGate, ConfirmationRequest};
pub use error::{ConfirmError, ProviderError, ToolError};
pub use event::{DomainEvent, EventBus};
pub use message::{Message, MessageToolCall, Role};
pub use provider::{
    Choice, ContentPart, GenerateOptions, GenerateRequest, GenerateResponse, Provider,
    ToolDefinition, WireMessage, WireRole,
};
pub use tool::{SafetyLevel, Tool, ToolInput, ToolRegistry, ToolResult};
