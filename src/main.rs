// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! huddle main entry point - CLI, commands, and REPL.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;

use huddle::approval::ApprovalMode;
use huddle::config::{self, CliOptions, ResolvedConfig};
use huddle::orchestrator::{OrchestratorCallbacks, TurnOutcome};
use huddle::repl::{agent_label, build_agent_registry, build_orchestrator, printing_callbacks, run_repl};
use huddle::telemetry::{init_telemetry, TelemetryConfig};

/// huddle version string.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// huddle - a small team of AI agents that hand work to each other.
#[derive(Parser)]
#[command(name = "huddle")]
#[command(author, version, about = "A small team of AI agents working one conversation", long_about = None)]
struct Cli {
    /// Base URL of the chat backend
    #[arg(long, env = "HUDDLE_BASE_URL")]
    base_url: Option<String>,

    /// Per-call completion deadline in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Tool calls allowed per agent turn
    #[arg(long)]
    max_tool_calls: Option<usize>,

    /// How hand-overs to the engineer are resolved
    #[arg(long, value_enum)]
    approval: Option<ApprovalArg>,

    /// Auto-approve hand-overs to the engineer
    #[arg(short = 'y', long)]
    yes: bool,

    /// Workspace the file tools are confined to
    #[arg(short = 'w', long)]
    workspace: Option<PathBuf>,

    /// Run a single instruction and exit
    #[arg(short = 'P', long)]
    prompt: Option<String>,

    /// Output format for non-interactive mode
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    output_format: OutputFormat,

    /// Show tool calls and turn statistics
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Show debug output
    #[arg(long)]
    debug: bool,

    /// Show trace output (full payloads)
    #[arg(long)]
    trace: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Output format for non-interactive mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ApprovalArg {
    Interactive,
    AutoApprove,
    AutoReject,
}

impl From<ApprovalArg> for ApprovalMode {
    fn from(arg: ApprovalArg) -> Self {
        match arg {
            ApprovalArg::Interactive => ApprovalMode::Interactive,
            ApprovalArg::AutoApprove => ApprovalMode::AutoApprove,
            ApprovalArg::AutoReject => ApprovalMode::AutoReject,
        }
    }
}

/// Subcommands for huddle.
#[derive(Subcommand)]
enum Commands {
    /// List the agent team
    Agents,

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },

    /// Initialize a new configuration file
    Init,

    /// Show version information
    Version,
}

/// Config subcommand actions.
#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _telemetry = init_telemetry(&TelemetryConfig::for_verbosity(cli.verbose, cli.debug, cli.trace))?;

    let approval_mode = if cli.yes {
        Some(ApprovalMode::AutoApprove)
    } else {
        cli.approval.map(ApprovalMode::from)
    };

    let cli_options = CliOptions {
        base_url: cli.base_url,
        api_key: None,
        timeout_ms: cli.timeout_ms,
        max_tool_calls: cli.max_tool_calls,
        approval_mode,
        workspace_root: cli.workspace,
    };

    if let Some(command) = cli.command {
        return handle_command(command, cli_options);
    }

    let workspace_root = project_root()?;
    let mut config = config::load_config(&workspace_root, cli_options)?;
    if config.workspace_root.is_none() {
        config.workspace_root = Some(workspace_root);
    }

    if let Some(prompt) = cli.prompt {
        return handle_prompt(&config, &prompt, cli.output_format, cli.verbose).await;
    }

    run_repl(&config, cli.verbose).await
}

/// Directory holding the nearest config file, else the current directory.
fn project_root() -> anyhow::Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    Ok(config::find_workspace_root(&cwd).unwrap_or(cwd))
}

fn handle_command(command: Commands, cli_options: CliOptions) -> anyhow::Result<()> {
    let workspace_root = project_root()?;
    match command {
        Commands::Agents => {
            let config = config::load_config(&workspace_root, cli_options)?;
            let registry = build_agent_registry(&config);
            for agent in registry.agents() {
                let leader = if agent.id == registry.default_agent_id() { " (leader)" } else { "" };
                let tools = if agent.can_use_tools { " [tools]" } else { "" };
                let targets: Vec<&str> = agent.delegates_to.iter().map(String::as_str).collect();
                println!(
                    "{} {} - {}{}{}",
                    agent_label(&agent.id),
                    agent.name,
                    agent.role,
                    leader,
                    tools
                );
                if !targets.is_empty() {
                    println!("    hands over to: {}", targets.join(", ").dimmed());
                }
            }
        }
        Commands::Config { action } => match action {
            Some(ConfigAction::Show) | None => {
                let config = config::load_config(&workspace_root, cli_options)?;
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
        },
        Commands::Init => {
            let path = config::init_config(&std::env::current_dir()?, None)?;
            println!("Created config file: {}", path.display());
        }
        Commands::Version => {
            println!("huddle {VERSION}");
        }
    }
    Ok(())
}

async fn handle_prompt(
    config: &ResolvedConfig,
    prompt: &str,
    format: OutputFormat,
    verbose: bool,
) -> anyhow::Result<()> {
    let callbacks = match format {
        OutputFormat::Text => printing_callbacks(verbose),
        OutputFormat::Json => OrchestratorCallbacks::default(),
    };
    let mut orchestrator = build_orchestrator(config, callbacks)?;

    let outcome = orchestrator.submit(prompt).await?;

    // Nobody is around to answer, so a parked hand-over is dropped.
    let skipped = match outcome {
        TurnOutcome::AwaitingApproval(pending) => {
            orchestrator.cancel(pending.id);
            Some(pending)
        }
        _ => None,
    };

    match format {
        OutputFormat::Text => {
            if let Some(pending) = &skipped {
                eprintln!(
                    "{} hand-over to {} needs approval; rerun with --yes to allow it",
                    "Skipped:".yellow(),
                    pending.target()
                );
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "success": true,
                "conversation": orchestrator.conversation(),
                "stats": orchestrator.last_turn_stats(),
                "skippedApproval": skipped,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
