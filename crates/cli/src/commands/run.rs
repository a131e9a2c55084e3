//! `uhh <prompt>`: simple mode or agent mode for one request.

use std::io::{BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uhh_agent::{AgentConfig, AgentLoop, Context, RunResult};
use uhh_config::{AppConfig, ProviderConfig};
use uhh_core::event::{DomainEvent, EventBus};
use uhh_core::provider::{GenerateOptions, Provider};
use uhh_providers::ProviderFactory;

use crate::confirm::TerminalGate;
use crate::history::{History, revision_addendum};
use crate::shell;

pub struct RunArgs {
    pub prompt: Vec<String>,
    pub provider: Option<String>,
    pub shell: Option<String>,
    pub model: Option<String>,
    pub auto_approve: bool,
    pub agent: bool,
}

pub async fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !AppConfig::exists() {
        eprintln!("First time setup detected. Running configuration wizard...");
        super::init::run().await?;
    }

    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let mut prompt = args.prompt.join(" ");
    if prompt.trim().is_empty() {
        prompt = read_line("What do you want? ")?;
    }
    let mut prompt = prompt.trim().to_string();
    if prompt.is_empty() {
        return Err("No prompt provided.".into());
    }

    let provider_name = args
        .provider
        .clone()
        .unwrap_or_else(|| config.default_provider.clone());
    let mut settings = config
        .providers
        .get(&provider_name)
        .cloned()
        .ok_or_else(|| format!("Unknown provider: {provider_name}"))?;
    if let Some(model) = &args.model {
        settings.model = model.clone();
    }

    let factory = ProviderFactory::with_builtins();
    let provider = factory
        .create(&provider_name, &settings)
        .map_err(|e| format!("Failed to initialize provider: {e}"))?;

    let history = History::default_location();
    let mut shell_name =
        shell::determine_shell(args.shell.as_deref(), config.shell.override_shell.as_deref());

    if let Some(addendum) = revision_addendum(&prompt).map(String::from) {
        match history.last_entry() {
            Some(last) if !last.prompt.is_empty() => {
                if args.shell.is_none() && config.shell.override_shell.is_none() {
                    shell_name = last.shell;
                }
                prompt = format!("{}. {addendum}", last.prompt);
                eprintln!("Revising previous prompt with new info...");
            }
            _ => eprintln!("No history found for revision."),
        }
    }

    let wants_agent = args.agent || !config.agent.enabled_tools.is_empty();
    if args.agent && !provider.supports_tool_calling() {
        warn!(provider = %provider_name, "Provider has no tool calling, falling back to simple mode");
    }

    let completion = if wants_agent && provider.supports_tool_calling() {
        run_agent_mode(provider, &config, &settings, &args, &prompt, &shell_name).await?
    } else {
        run_simple_mode(provider, &config, &settings, &prompt, &shell_name).await?
    };

    println!("{completion}");

    if let Err(e) = history.append(&shell_name, &prompt, &completion) {
        warn!(path = %history.path().display(), error = %e, "Failed to write history");
    }

    Ok(())
}

async fn run_simple_mode(
    provider: Arc<dyn Provider>,
    config: &AppConfig,
    settings: &ProviderConfig,
    prompt: &str,
    shell_name: &str,
) -> Result<String, Box<dyn std::error::Error>> {
    let prompt = shell::build_prompt(
        prompt,
        shell_name,
        config.shell.append_file_context,
        config.shell.max_context_tokens,
    );
    let options = GenerateOptions {
        model: None,
        temperature: settings.temperature,
        max_tokens: settings.max_tokens,
    };

    debug!(provider = provider.name(), shell = shell_name, "Simple mode");

    tokio::select! {
        result = provider.complete(&prompt, &options) => Ok(result?.trim().to_string()),
        _ = tokio::signal::ctrl_c() => Err("Interrupted".into()),
    }
}

async fn run_agent_mode(
    provider: Arc<dyn Provider>,
    config: &AppConfig,
    settings: &ProviderConfig,
    args: &RunArgs,
    prompt: &str,
    shell_name: &str,
) -> Result<String, Box<dyn std::error::Error>> {
    let tools = Arc::new(uhh_tools::registry_with_timeout(Duration::from_secs(
        config.agent.tool_timeout_secs,
    )));

    let auto_approve = args.auto_approve || config.agent.auto_approve;
    let agent_config = AgentConfig {
        auto_approve,
        max_iterations: config.agent.max_iterations,
        temperature: settings.temperature,
        max_tokens: settings.max_tokens,
        model: None,
        allowed_tools: (!config.agent.enabled_tools.is_empty())
            .then(|| config.agent.enabled_tools.clone()),
        working_dir: std::env::current_dir().ok(),
    };

    let event_bus = Arc::new(EventBus::default());
    let progress = tokio::spawn(print_progress(event_bus.clone()));

    let mut agent = AgentLoop::new(provider, tools)
        .with_config(agent_config)
        .with_event_bus(event_bus);
    if !auto_approve {
        agent = agent.with_gate(Arc::new(TerminalGate::new()));
    }

    let mut context = Context::new(shell::agent_system_prompt(shell_name))
        .with_max_messages(config.agent.max_messages);

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let result = agent.run(&mut context, prompt, &cancel).await;
    ctrl_c.abort();
    progress.abort();

    let result = result?;
    if let Some(summary) = summary_line(&result) {
        eprintln!("{summary}");
    }

    match result.error {
        Some(err) if !result.success => Err(format!("Error: {err}").into()),
        _ => Ok(result.final_answer),
    }
}

/// "Used N tools in M iterations", when any tool was called.
pub fn summary_line(result: &RunResult) -> Option<String> {
    (!result.tools_used.is_empty()).then(|| {
        format!(
            "Used {} tools in {} iterations",
            result.tools_used.len(),
            result.iterations
        )
    })
}

async fn print_progress(bus: Arc<EventBus>) {
    let mut rx = bus.subscribe();
    while let Ok(event) = rx.recv().await {
        match event.as_ref() {
            DomainEvent::ToolExecuted {
                tool_name,
                success,
                duration_ms,
                ..
            } => {
                let status = if *success { "done" } else { "failed" };
                eprintln!("[{tool_name}] {status} ({duration_ms} ms)");
            }
            DomainEvent::ToolSkipped { tool_name, .. } => {
                eprintln!("[{tool_name}] skipped");
            }
            _ => {}
        }
    }
}

fn read_line(prompt: &str) -> std::io::Result<String> {
    eprint!("{prompt}");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uhh_agent::ToolExecution;

    #[test]
    fn summary_only_when_tools_ran() {
        let mut result = RunResult {
            final_answer: "done".into(),
            iterations: 1,
            success: true,
            ..Default::default()
        };
        assert!(summary_line(&result).is_none());

        result.tools_used = vec![ToolExecution::default(), ToolExecution::default()];
        result.iterations = 3;
        assert_eq!(
            summary_line(&result).as_deref(),
            Some("Used 2 tools in 3 iterations")
        );
    }
}
