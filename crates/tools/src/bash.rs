//! Bash tool: run a shell command with a timeout and bounded output.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};
use uhh_core::error::ToolError;
use uhh_core::tool::{SafetyLevel, Tool, ToolInput, ToolResult};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Output beyond this many characters is cut.
pub const MAX_OUTPUT_CHARS: usize = 10_000;

pub const TRUNCATION_MARKER: &str = "\n... (output truncated)";
pub const NO_OUTPUT_MARKER: &str = "(command completed with no output)";

/// Executes commands through `sh -c` (or `cmd /C` on Windows).
///
/// Every call is bounded by the tool's own timeout regardless of any outer
/// cancellation. The child is killed when the call's future is dropped, so
/// both a timeout and a cancelled run take the subprocess down with them.
pub struct BashTool {
    timeout: Duration,
}

impl BashTool {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The command from a JSON `{"command": ...}` object, or the raw text
    /// when the input is not a JSON object.
    fn command_from(input: &ToolInput) -> String {
        match &input.parsed {
            Some(serde_json::Value::Object(map)) => map
                .get("command")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            _ => input.raw.clone(),
        }
    }

    fn shell_command(command: &str) -> Command {
        if cfg!(target_os = "windows") {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", command]);
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.args(["-c", command]);
            cmd
        }
    }
}

impl Default for BashTool {
    fn default() -> Self {
        Self::new()
    }
}

/// Cut `text` to at most `max` characters, appending the truncation marker.
fn truncate_output(text: String, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => {
            let mut cut = text[..byte_idx].to_string();
            cut.push_str(TRUNCATION_MARKER);
            cut
        }
        None => text,
    }
}

#[async_trait]
impl Tool for BashTool {
    fn name(&self) -> &str {
        "bash"
    }

    fn description(&self) -> &str {
        "Execute shell commands. Use this to run terminal commands and scripts. Input should be a JSON object with a 'command' field."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The shell command to execute"
                }
            },
            "required": ["command"]
        })
    }

    fn requires_confirmation(&self) -> bool {
        true
    }

    fn safety_level(&self) -> SafetyLevel {
        SafetyLevel::Dangerous
    }

    fn describe(&self, raw_arguments: &str) -> String {
        let command = Self::command_from(&ToolInput::new(raw_arguments));
        match uhh_security::dangerous_command_warning(&command) {
            Some(warning) => format!("Run command: {command}\n{warning}"),
            None => format!("Run command: {command}"),
        }
    }

    async fn execute(&self, input: ToolInput) -> Result<ToolResult, ToolError> {
        let command = Self::command_from(&input);
        if command.trim().is_empty() {
            return Err(ToolError::InvalidArguments("command cannot be empty".into()));
        }

        if let Some(warning) = uhh_security::dangerous_command_warning(&command) {
            warn!(command = %command, %warning, "Executing flagged command");
        }
        debug!(command = %command, timeout_secs = self.timeout.as_secs(), "Executing shell command");

        let mut cmd = Self::shell_command(&command);
        cmd.stdin(Stdio::null()).kill_on_drop(true);
        if let Some(dir) = &input.working_dir {
            cmd.current_dir(dir);
        }

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Err(_) => {
                warn!(command = %command, "Command timed out");
                return Err(ToolError::Timeout {
                    tool_name: "bash".into(),
                    timeout: self.timeout,
                });
            }
            Ok(Err(e)) => {
                return Err(ToolError::ExecutionFailed {
                    tool_name: "bash".into(),
                    reason: e.to_string(),
                });
            }
            Ok(Ok(output)) => output,
        };

        let mut result = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.stderr.is_empty() {
            if !result.is_empty() {
                result.push('\n');
            }
            result.push_str("[stderr]\n");
            result.push_str(&String::from_utf8_lossy(&output.stderr));
        }
        let result = truncate_output(result, MAX_OUTPUT_CHARS);

        if !output.status.success() {
            let reason = match output.status.code() {
                Some(code) => format!("exit status {code}"),
                None => "terminated by signal".to_string(),
            };
            debug!(command = %command, %reason, "Command failed");
            if result.is_empty() {
                return Err(ToolError::ExecutionFailed {
                    tool_name: "bash".into(),
                    reason,
                });
            }
            return Ok(ToolResult::failed(result, reason));
        }

        if result.is_empty() {
            return Ok(ToolResult::ok(NO_OUTPUT_MARKER));
        }
        Ok(ToolResult::ok(result))
    }
}
