//! Terminal confirmation gate: asks y/N on stdin before a tool runs.

use std::io::{BufRead, Write};

use async_trait::async_trait;
use uhh_core::confirm::{ConfirmationGate, ConfirmationRequest};
use uhh_core::error::ConfirmError;

#[derive(Default)]
pub struct TerminalGate;

impl TerminalGate {
    pub fn new() -> Self {
        Self
    }
}

/// The text shown above the y/N question.
pub fn render_request(request: &ConfirmationRequest) -> String {
    let mut text = format!("Tool: {}\n", request.tool_name);
    if !request.description.is_empty() {
        text.push_str(&format!("Description: {}\n", request.description));
    }
    if !request.raw_arguments.is_empty() {
        text.push_str(&format!("Arguments: {}\n", request.raw_arguments));
    }
    text
}

/// `y`/`yes` approves; anything else declines.
pub fn parse_answer(line: &str) -> bool {
    matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn ask(prompt: String) -> Result<bool, ConfirmError> {
    let mut stderr = std::io::stderr();
    write!(stderr, "\n{prompt}Allow this tool to execute? [y/N]: ")
        .and_then(|_| stderr.flush())
        .map_err(|e| ConfirmError::Failed(e.to_string()))?;

    let mut line = String::new();
    let read = std::io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| ConfirmError::Failed(e.to_string()))?;

    if read == 0 {
        return Err(ConfirmError::Interrupted);
    }
    Ok(parse_answer(&line))
}

#[async_trait]
impl ConfirmationGate for TerminalGate {
    async fn confirm(&self, request: &ConfirmationRequest) -> Result<bool, ConfirmError> {
        let prompt = render_request(request);
        tokio::task::spawn_blocking(move || ask(prompt))
            .await
            .map_err(|e| ConfirmError::Failed(e.to_string()))?
    }
}
