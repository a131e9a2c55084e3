//! The agent loop: the heart of uhh's agent mode.
//!
//! The agent follows a **Call → Act → Observe** cycle:
//!
//! 1. **Seed** the [`Context`] with the user's request
//! 2. **Render** the context and send it, with the tool schema, to the provider
//! 3. **If tool calls**: confirm and execute each in order, append the results,
//!    loop back to step 2
//! 4. **If text**: that is the final answer
//!
//! The loop stops at the first text answer, an explicit end of turn, a
//! provider failure, cancellation, or when the iteration budget runs out.

pub mod context;
pub mod error;
pub mod loop_runner;

pub use context::{Context, DEFAULT_MAX_MESSAGES};
pub use error::AgentError;
pub use loop_runner::{
    AgentConfig, AgentLoop, DEFAULT_MAX_ITERATIONS, RunResult, RunState, SKIP_NOTICE,
    ToolExecution,
};
