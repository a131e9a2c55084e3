//! Error types for the uhh domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each seam (provider, tool, confirmation) has its own error type so the
//! agent loop can decide which failures are fatal to a run and which are
//! fed back to the model.

use std::time::Duration;

use thiserror::Error;

/// Failures of the language model service. Fatal to an agent run.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failures of a single tool call. Recorded per call and fed back to the model.
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    NotFound(String),

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("{tool_name} failed: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("command timed out after {timeout:?}")]
    Timeout { tool_name: String, timeout: Duration },

    #[error("path traversal not allowed: {0}")]
    PathTraversal(String),

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("{0} is a directory, not a file")]
    IsDirectory(String),

    #[error("file too large ({size} bytes, max {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },

    #[error("I/O error: {0}")]
    Io(String),
}

/// Failures of the confirmation gate. Abort the current tool call only.
#[derive(Debug, Clone, Error)]
pub enum ConfirmError {
    #[error("confirmation interrupted")]
    Interrupted,

    #[error("confirmation failed: {0}")]
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        };
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn unknown_tool_message() {
        let err = ToolError::NotFound("teleport".into());
        assert_eq!(err.to_string(), "unknown tool: teleport");
    }

    #[test]
    fn timeout_is_distinct_from_failure() {
        let err = ToolError::Timeout {
            tool_name: "bash".into(),
            timeout: Duration::from_secs(30),
        };
        assert!(err.to_string().contains("timed out after 30s"));
    }

    #[test]
    fn sub_second_timeout_keeps_precision() {
        let err = ToolError::Timeout {
            tool_name: "bash".into(),
            timeout: Duration::from_millis(200),
        };
        assert_eq!(err.to_string(), "command timed out after 200ms");
    }
}
