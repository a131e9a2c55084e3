//! uhh CLI, the main entry point.
//!
//! Commands:
//! - `uhh <prompt>`: turn a request into a shell command, or run it as an agent task
//! - `init`: write a config for a provider and API key
//! - `config`: show, locate, or change configuration; list models
//! - `history`: show or clear past prompts
//! - `version`: print version information

use clap::{Parser, Subcommand};

mod commands;
mod confirm;
mod history;
mod shell;

#[derive(Parser)]
#[command(
    name = "uhh",
    about = "uhh: AI-powered terminal command assistant",
    version,
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// What you want, in plain words (read from stdin when omitted)
    prompt: Vec<String>,

    /// LLM provider to use (openai, gemini, deepseek, kimi, glm)
    #[arg(short, long)]
    provider: Option<String>,

    /// Override shell detection (powershell, cmd, bash, zsh, fish)
    #[arg(short, long)]
    shell: Option<String>,

    /// Model to use
    #[arg(short, long)]
    model: Option<String>,

    /// Run tools without asking for confirmation
    #[arg(short = 'y', long)]
    auto_approve: bool,

    /// Run in agent mode with tool calling
    #[arg(short, long)]
    agent: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize or reconfigure uhh
    Init,

    /// Show or change configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },

    /// Show recent prompts
    History {
        /// Number of entries to show
        #[arg(short = 'n', long, default_value_t = 10)]
        count: usize,

        #[command(subcommand)]
        action: Option<HistoryAction>,
    },

    /// Print version information
    Version,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the current configuration
    Show,

    /// Print the config file path
    Path,

    /// Set a configuration value (provider, model, auto-approve, max-iterations)
    Set { key: String, value: String },

    /// List models available from a provider
    Models {
        /// Provider name (defaults to the configured default)
        provider: Option<String>,
    },
}

#[derive(Subcommand)]
enum HistoryAction {
    /// Remove all history entries
    Clear,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing; stdout is reserved for command output
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Init) => commands::init::run().await?,
        Some(Commands::Config { action }) => match action.unwrap_or(ConfigAction::Show) {
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
            ConfigAction::Set { key, value } => commands::config_cmd::set(&key, &value).await?,
            ConfigAction::Models { provider } => {
                commands::config_cmd::models(provider.as_deref()).await?
            }
        },
        Some(Commands::History { count, action }) => match action {
            Some(HistoryAction::Clear) => commands::history_cmd::clear().await?,
            None => commands::history_cmd::show(count).await?,
        },
        Some(Commands::Version) => println!("uhh version {}", env!("CARGO_PKG_VERSION")),
        None => {
            commands::run::run(commands::run::RunArgs {
                prompt: cli.prompt,
                provider: cli.provider,
                shell: cli.shell,
                model: cli.model,
                auto_approve: cli.auto_approve,
                agent: cli.agent,
            })
            .await?
        }
    }

    Ok(())
}
