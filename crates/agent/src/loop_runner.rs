//! The agent reasoning loop implementation.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uhh_core::confirm::{ConfirmationGate, ConfirmationRequest};
use uhh_core::event::{DomainEvent, EventBus};
use uhh_core::message::MessageToolCall;
use uhh_core::provider::{GenerateOptions, GenerateRequest, Provider, ToolDefinition};
use uhh_core::tool::{Tool, ToolInput, ToolRegistry};
use uhh_core::{ProviderError, ToolError};

use crate::context::Context;
use crate::error::AgentError;

/// Fed back to the model when the user declines a tool call.
pub const SKIP_NOTICE: &str = "Tool execution was skipped by user.";

pub const DEFAULT_MAX_ITERATIONS: u32 = 10;

/// Knobs for a single agent loop.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Run tools that require confirmation without asking the gate
    pub auto_approve: bool,

    /// Upper bound on model calls per run
    pub max_iterations: u32,

    pub temperature: f32,

    pub max_tokens: Option<u32>,

    /// Override the provider's configured model
    pub model: Option<String>,

    /// Narrow the tool schema (and dispatch) to these names
    pub allowed_tools: Option<Vec<String>>,

    /// Directory tools resolve relative paths and run commands in
    pub working_dir: Option<PathBuf>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            auto_approve: false,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            temperature: 0.7,
            max_tokens: None,
            model: None,
            allowed_tools: None,
            working_dir: None,
        }
    }
}

/// Where a run stands.
#[derive(Debug, Clone)]
pub enum RunState {
    Running { iteration: u32 },
    Succeeded { answer: String },
    Failed { error: AgentError },
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunState::Running { .. })
    }
}

/// Record of one tool call.
#[derive(Debug, Clone, Default)]
pub struct ToolExecution {
    pub tool_name: String,

    /// Raw arguments as the model sent them
    pub input: String,

    pub output: String,

    pub approved: bool,

    pub skipped: bool,

    pub duration: Duration,

    /// Lookup, confirmation, or execution failure
    pub error: Option<String>,
}

impl ToolExecution {
    fn new(call: &MessageToolCall) -> Self {
        Self {
            tool_name: call.name.clone(),
            input: call.arguments.clone(),
            ..Default::default()
        }
    }

    /// The text handed back to the model as this call's result.
    pub fn feedback(&self) -> String {
        match (&self.error, self.skipped) {
            (Some(err), _) if self.output.is_empty() => format!("Error: {err}"),
            (Some(err), _) => format!("{}\nError: {err}", self.output),
            (None, true) => SKIP_NOTICE.to_string(),
            (None, false) => self.output.clone(),
        }
    }
}

/// Outcome of [`AgentLoop::run`].
#[derive(Debug, Clone, Default)]
pub struct RunResult {
    pub final_answer: String,
    pub tools_used: Vec<ToolExecution>,
    pub iterations: u32,
    pub success: bool,
    pub error: Option<AgentError>,
}

/// The core agent loop that orchestrates LLM calls and tool execution.
///
/// One run is strictly sequential: at most one model call or one tool is in
/// flight at a time, and tool calls from one response run in the order the
/// model returned them.
pub struct AgentLoop {
    provider: Arc<dyn Provider>,
    tools: Arc<ToolRegistry>,
    config: AgentConfig,

    /// No gate means every call is implicitly approved
    gate: Option<Arc<dyn ConfirmationGate>>,

    event_bus: Option<Arc<EventBus>>,
}

impl AgentLoop {
    pub fn new(provider: Arc<dyn Provider>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            provider,
            tools,
            config: AgentConfig::default(),
            gate: None,
            event_bus: None,
        }
    }

    pub fn with_config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the maximum number of model calls per run.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.config.max_iterations = max;
        self
    }

    pub fn with_auto_approve(mut self, auto_approve: bool) -> Self {
        self.config.auto_approve = auto_approve;
        self
    }

    pub fn with_allowed_tools(mut self, names: Vec<String>) -> Self {
        self.config.allowed_tools = Some(names);
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.working_dir = Some(dir.into());
        self
    }

    pub fn with_gate(mut self, gate: Arc<dyn ConfirmationGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(bus);
        self
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// One-shot completion without tools.
    pub async fn simple_call(&self, prompt: &str) -> Result<String, ProviderError> {
        self.provider.complete(prompt, &self.options()).await
    }

    /// Run the loop for one user prompt.
    ///
    /// The prompt is appended to `context`, then the model is called until
    /// it answers with text, signals the end of its turn, or the iteration
    /// budget runs out. Returns `Err` only when the run cannot start.
    pub async fn run(
        &self,
        context: &mut Context,
        user_prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<RunResult, AgentError> {
        if user_prompt.trim().is_empty() {
            return Err(AgentError::EmptyPrompt);
        }
        if self.config.max_iterations == 0 {
            return Err(AgentError::InvalidConfig(
                "max_iterations must be at least 1".into(),
            ));
        }

        info!(
            provider = self.provider.name(),
            max_iterations = self.config.max_iterations,
            auto_approve = self.config.auto_approve,
            "Starting agent run"
        );

        context.add_user_message(user_prompt);
        let definitions = self.tool_definitions();
        let mut result = RunResult::default();
        let mut state = RunState::Running { iteration: 0 };

        loop {
            match state {
                RunState::Running { iteration } if iteration >= self.config.max_iterations => {
                    warn!(iterations = iteration, "Max iterations reached");
                    state = RunState::Failed {
                        error: AgentError::MaxIterations(self.config.max_iterations),
                    };
                }
                RunState::Running { iteration } => {
                    let iteration = iteration + 1;
                    result.iterations = iteration;
                    state = self
                        .step(context, iteration, &definitions, &mut result.tools_used, cancel)
                        .await;
                }
                RunState::Succeeded { answer } => {
                    result.success = true;
                    result.final_answer = answer;
                    break;
                }
                RunState::Failed { error } => {
                    result.error = Some(error);
                    break;
                }
            }
        }

        info!(
            success = result.success,
            iterations = result.iterations,
            tools_used = result.tools_used.len(),
            "Agent run finished"
        );
        self.publish(DomainEvent::RunFinished {
            success: result.success,
            iterations: result.iterations,
            tools_used: result.tools_used.len(),
            timestamp: Utc::now(),
        });

        Ok(result)
    }

    /// One model call and the tool calls it asks for.
    async fn step(
        &self,
        context: &mut Context,
        iteration: u32,
        definitions: &[ToolDefinition],
        executions: &mut Vec<ToolExecution>,
        cancel: &CancellationToken,
    ) -> RunState {
        let request = GenerateRequest {
            messages: context.render(),
            tools: definitions.to_vec(),
            options: self.options(),
        };
        debug!(iteration, messages = request.messages.len(), "Agent loop iteration");

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Self::cancelled(),
            response = self.provider.generate(request) => response,
        };

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                warn!(iteration, error = %e, "Provider call failed");
                return RunState::Failed { error: e.into() };
            }
        };

        let Some(choice) = response.choices.into_iter().next() else {
            warn!(iteration, "Provider returned no choices");
            return RunState::Failed {
                error: AgentError::NoResponse,
            };
        };

        self.publish(DomainEvent::ResponseGenerated {
            iteration,
            tool_calls: choice.tool_calls.len(),
            timestamp: Utc::now(),
        });

        if !choice.tool_calls.is_empty() {
            debug!(tool_count = choice.tool_calls.len(), "Executing tool calls");
            let calls = choice.tool_calls;
            context.add_assistant_message_with_tool_calls(choice.content, calls.clone());

            for (i, call) in calls.iter().enumerate() {
                let execution = self.dispatch(call, cancel).await;
                context.add_tool_result(&call.id, execution.feedback());
                executions.push(execution);

                if cancel.is_cancelled() {
                    // Every call in the batch still gets a result message
                    let notice = format!("Error: {}", AgentError::Cancelled);
                    for pending in &calls[i + 1..] {
                        context.add_tool_result(&pending.id, notice.clone());
                    }
                    return Self::cancelled();
                }
            }
            return RunState::Running { iteration };
        }

        if !choice.content.is_empty() {
            context.add_assistant_message(&choice.content);
            return RunState::Succeeded {
                answer: choice.content,
            };
        }

        if choice.is_end_of_turn() {
            return RunState::Succeeded {
                answer: String::new(),
            };
        }

        debug!(iteration, stop_reason = ?choice.stop_reason, "Empty response, asking again");
        RunState::Running { iteration }
    }

    /// Look up, confirm, and execute one tool call.
    ///
    /// Every failure, cancellation included, is recorded on the returned
    /// execution.
    async fn dispatch(
        &self,
        call: &MessageToolCall,
        cancel: &CancellationToken,
    ) -> ToolExecution {
        let start = Instant::now();
        let mut execution = ToolExecution::new(call);

        let tool = match self.lookup(&call.name) {
            Ok(tool) => tool,
            Err(e) => {
                warn!(tool = %call.name, "Model requested an unknown tool");
                execution.error = Some(e.to_string());
                execution.duration = start.elapsed();
                return execution;
            }
        };

        let needs_confirmation = tool.requires_confirmation() && !self.config.auto_approve;
        if needs_confirmation && let Some(gate) = &self.gate {
            let request = ConfirmationRequest {
                tool_name: call.name.clone(),
                description: tool.describe(&call.arguments),
                raw_arguments: call.arguments.clone(),
            };

            let answer = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Self::interrupted(execution, start),
                answer = gate.confirm(&request) => answer,
            };

            match answer {
                Ok(true) => {}
                Ok(false) => {
                    debug!(tool = %call.name, "Tool call declined");
                    execution.skipped = true;
                    execution.duration = start.elapsed();
                    self.publish(DomainEvent::ToolSkipped {
                        tool_name: call.name.clone(),
                        timestamp: Utc::now(),
                    });
                    return execution;
                }
                Err(e) => {
                    warn!(tool = %call.name, error = %e, "Confirmation failed");
                    execution.error = Some(e.to_string());
                    execution.duration = start.elapsed();
                    return execution;
                }
            }
        }
        execution.approved = true;

        let input = ToolInput::new(call.arguments.clone())
            .with_working_dir(self.config.working_dir.clone());

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Self::interrupted(execution, start),
            outcome = tool.execute(input) => outcome,
        };
        execution.duration = start.elapsed();

        match outcome {
            Ok(result) if result.success => execution.output = result.output,
            Ok(result) => {
                execution.output = result.output;
                execution.error = Some(
                    result
                        .error
                        .unwrap_or_else(|| format!("{} reported failure", call.name)),
                );
            }
            Err(e) => execution.error = Some(e.to_string()),
        }

        if let Some(err) = &execution.error {
            warn!(tool = %call.name, error = %err, "Tool execution failed");
        }
        debug!(
            tool = %call.name,
            duration_ms = execution.duration.as_millis() as u64,
            "Tool executed"
        );
        self.publish(DomainEvent::ToolExecuted {
            tool_name: call.name.clone(),
            success: execution.error.is_none(),
            duration_ms: execution.duration.as_millis() as u64,
            timestamp: Utc::now(),
        });

        execution
    }

    fn interrupted(mut execution: ToolExecution, start: Instant) -> ToolExecution {
        debug!(tool = %execution.tool_name, "Tool call interrupted by cancellation");
        execution.error = Some(AgentError::Cancelled.to_string());
        execution.duration = start.elapsed();
        execution
    }

    fn lookup(&self, name: &str) -> Result<Arc<dyn Tool>, ToolError> {
        if let Some(allowed) = &self.config.allowed_tools
            && !allowed.iter().any(|n| n == name)
        {
            return Err(ToolError::NotFound(name.to_string()));
        }
        self.tools.get(name)
    }

    fn tool_definitions(&self) -> Vec<ToolDefinition> {
        match &self.config.allowed_tools {
            Some(names) => self
                .tools
                .filter_by_names(names)
                .iter()
                .map(|t| t.to_definition())
                .collect(),
            None => self.tools.definitions(),
        }
    }

    fn options(&self) -> GenerateOptions {
        GenerateOptions {
            model: self.config.model.clone(),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        }
    }

    fn publish(&self, event: DomainEvent) {
        if let Some(bus) = &self.event_bus {
            bus.publish(event);
        }
    }

    fn cancelled() -> RunState {
        info!("Agent run cancelled");
        RunState::Failed {
            error: AgentError::Cancelled,
        }
    }
}
