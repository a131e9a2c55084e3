use uhh_core::error::ProviderError;

/// Why an agent run failed.
///
/// Only [`AgentError::EmptyPrompt`] and [`AgentError::InvalidConfig`] are
/// returned as `Err` from `AgentLoop::run`; the rest end a run that did
/// start and are reported in `RunResult::error`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AgentError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("no response from LLM")]
    NoResponse,

    #[error("max iterations ({0}) reached")]
    MaxIterations(u32),

    #[error("run cancelled")]
    Cancelled,

    #[error("prompt cannot be empty")]
    EmptyPrompt,

    #[error("invalid agent configuration: {0}")]
    InvalidConfig(String),
}
