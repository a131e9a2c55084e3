//! Confirmation gate: the human checkpoint before risky tool execution.
//!
//! The agent loop awaits the gate and does nothing else until it answers.
//! There is no timeout: a gate that never answers stalls the run until
//! the caller cancels it.

use async_trait::async_trait;

use crate::error::ConfirmError;

/// What the gate is asked to approve.
#[derive(Debug, Clone)]
pub struct ConfirmationRequest {
    pub tool_name: String,

    /// Human-readable description (may include advisory warnings)
    pub description: String,

    /// Raw argument text the model supplied
    pub raw_arguments: String,
}

#[async_trait]
pub trait ConfirmationGate: Send + Sync {
    /// `Ok(true)` to run the tool, `Ok(false)` to skip it.
    async fn confirm(&self, request: &ConfirmationRequest) -> Result<bool, ConfirmError>;
}

/// Approves everything. Useful for `--auto-approve` style callers and tests.
pub struct AutoApprove;

#[async_trait]
impl ConfirmationGate for AutoApprove {
    async fn confirm(&self, _request: &ConfirmationRequest) -> Result<bool, ConfirmError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn auto_approve_always_approves() {
        let gate = AutoApprove;
        let request = ConfirmationRequest {
            tool_name: "bash".into(),
            description: "Run command: rm -rf /".into(),
            raw_arguments: r#"{"command":"rm -rf /"}"#.into(),
        };
        assert!(gate.confirm(&request).await.unwrap());
    }
}
