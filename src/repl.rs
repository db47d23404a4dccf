// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Terminal front-end: session wiring, message rendering and the REPL.
//!
//! The REPL reads one instruction per line, prints every committed message
//! as it happens (through the orchestrator's observer hooks) and asks for a
//! y/N decision whenever a hand-over to the engineer is parked.

use std::path::PathBuf;
use std::sync::Arc;

use colored::{ColoredString, Colorize};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::agents::{builtin_agents, AgentRegistry, AgentRegistryBuilder};
use crate::approval::PendingApproval;
use crate::config::ResolvedConfig;
use crate::orchestrator::{Orchestrator, OrchestratorCallbacks, OrchestratorOptions, TurnOutcome, TurnStats};
use crate::providers::create_client_from_config;
use crate::tools::ToolRegistry;
use crate::types::{ConversationMessage, Role, ToolInvocationRequest};

/// Agent table described by a resolved configuration.
pub fn build_agent_registry(config: &ResolvedConfig) -> AgentRegistry {
    let mut builder = AgentRegistryBuilder::new();
    for agent in builtin_agents() {
        builder.register(agent);
    }
    builder.default_agent(config.default_agent.as_str());
    if let Some(ref additions) = config.system_prompt_additions {
        builder.prompt_additions(additions.as_str());
    }
    builder.build()
}

/// Directory the file tools are confined to.
pub fn workspace_root(config: &ResolvedConfig) -> anyhow::Result<PathBuf> {
    match config.workspace_root {
        Some(ref root) => Ok(root.clone()),
        None => Ok(std::env::current_dir()?),
    }
}

/// Build a ready-to-use session from configuration.
pub fn build_orchestrator(
    config: &ResolvedConfig,
    callbacks: OrchestratorCallbacks,
) -> anyhow::Result<Orchestrator> {
    let client = create_client_from_config(config)?;
    let tools = ToolRegistry::for_workspace(workspace_root(config)?);

    Ok(Orchestrator::new(OrchestratorOptions {
        client,
        agents: Arc::new(build_agent_registry(config)),
        tools: Arc::new(tools),
        config: config.orchestrator_config(),
        callbacks,
    }))
}

/// Observer hooks that print to the terminal.
pub fn printing_callbacks(verbose: bool) -> OrchestratorCallbacks {
    OrchestratorCallbacks {
        on_message: Some(Arc::new(|message: &ConversationMessage| {
            if message.role != Role::User {
                print_message(message);
            }
        })),
        on_step: verbose.then(|| {
            Arc::new(|invocation: &ToolInvocationRequest| print_tool_step(invocation))
                as Arc<dyn Fn(&ToolInvocationRequest) + Send + Sync>
        }),
        on_approval_required: None,
        on_turn_complete: verbose.then(|| {
            Arc::new(|stats: &TurnStats| print_stats(stats)) as Arc<dyn Fn(&TurnStats) + Send + Sync>
        }),
    }
}

/// Colored `name` label for an agent id.
pub fn agent_label(agent: &str) -> ColoredString {
    match agent {
        "mike" => agent.bright_blue().bold(),
        "emma" => agent.bright_magenta().bold(),
        "iris" => agent.bright_cyan().bold(),
        "sarah" => agent.bright_yellow().bold(),
        "alex" => agent.bright_green().bold(),
        "system" => agent.red().bold(),
        _ => agent.bright_white().bold(),
    }
}

pub fn print_message(message: &ConversationMessage) {
    match message.role {
        Role::System => println!("{} {}", "!".red(), message.content.dimmed()),
        _ => {
            println!("{} {}", agent_label(&message.agent), message.content);
            println!();
        }
    }
}

fn print_tool_step(invocation: &ToolInvocationRequest) {
    println!(
        "  {} {} {}",
        "→".cyan(),
        invocation.name.bright_white(),
        invocation.params_value().to_string().dimmed()
    );
}

fn print_stats(stats: &TurnStats) {
    println!(
        "{}",
        format!(
            "  {} completions, {} tools, {} hand-overs, {} tokens, {:.1}s",
            stats.completion_calls,
            stats.tool_calls,
            stats.delegations,
            stats.total_tokens(),
            stats.duration_ms as f64 / 1000.0
        )
        .dimmed()
    );
}

fn print_pending(pending: &PendingApproval) {
    println!(
        "{} {} wants to hand this to {}:",
        "?".yellow().bold(),
        agent_label(&pending.from),
        agent_label(pending.target())
    );
    for line in pending.brief().lines() {
        println!("    {line}");
    }
}

fn print_welcome(orchestrator: &Orchestrator) {
    println!();
    println!("{}", "huddle - multi-agent team".bright_blue().bold());
    let team: Vec<String> = orchestrator
        .agents()
        .agents()
        .map(|a| format!("{} ({})", agent_label(&a.id), a.role))
        .collect();
    println!("Team: {}", team.join(", "));
    println!(
        "{}",
        "Mention @alex, @iris, @emma or @sarah to address someone directly. /help for commands."
            .dimmed()
    );
    println!();
}

fn print_help() {
    println!();
    println!("Commands:");
    println!("  /help, /h     - Show this help");
    println!("  /agents       - List the team");
    println!("  /usage        - Show token usage for this session");
    println!("  /history      - Print the conversation as JSON");
    println!("  /quit, /q     - Exit");
    println!();
}

/// Slash commands. Returns true if the REPL should exit.
fn handle_command(orchestrator: &Orchestrator, command: &str) -> bool {
    match command {
        "/quit" | "/exit" | "/q" => return true,
        "/help" | "/h" | "/?" => print_help(),
        "/agents" => {
            for agent in orchestrator.agents().agents() {
                let tools = if agent.can_use_tools { " [tools]" } else { "" };
                println!("  {} - {}{}", agent_label(&agent.id), agent.role, tools);
            }
        }
        "/usage" => {
            let usage = orchestrator.conversation().usage();
            println!(
                "  {} input + {} output = {} tokens",
                usage.input_tokens,
                usage.output_tokens,
                usage.total()
            );
        }
        "/history" => match orchestrator.conversation().to_json() {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("{} {e}", "Error:".red()),
        },
        other => {
            println!("Unknown command: {other}");
            println!("Type /help for available commands");
        }
    }
    false
}

/// Ask for a decision on every parked hand-over until the chain settles.
async fn resolve_approvals(
    editor: &mut DefaultEditor,
    orchestrator: &mut Orchestrator,
    mut outcome: TurnOutcome,
) -> anyhow::Result<()> {
    while let TurnOutcome::AwaitingApproval(pending) = outcome {
        print_pending(&pending);
        let answer = match editor.readline("Approve? [y/N] ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => String::new(),
            Err(e) => return Err(e.into()),
        };

        if matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
            outcome = orchestrator.approve(pending.id).await;
        } else {
            orchestrator.cancel(pending.id);
            println!("{}", "Hand-over cancelled.".dimmed());
            outcome = TurnOutcome::Completed;
        }
    }
    Ok(())
}

/// Run the interactive REPL until `/quit` or end of input.
pub async fn run_repl(config: &ResolvedConfig, verbose: bool) -> anyhow::Result<()> {
    let mut orchestrator = build_orchestrator(config, printing_callbacks(verbose))?;
    let mut editor = DefaultEditor::new()?;

    let history_path = dirs::data_dir().map(|p| p.join("huddle").join("history.txt"));
    if let Some(ref path) = history_path {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let _ = editor.load_history(path);
    }

    print_welcome(&orchestrator);

    loop {
        let line = match editor.readline(">>> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{} {e:?}", "Error:".red());
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(line);

        if line.starts_with('/') {
            if handle_command(&orchestrator, line) {
                break;
            }
            continue;
        }

        println!();
        match orchestrator.submit(line).await {
            Ok(outcome) => resolve_approvals(&mut editor, &mut orchestrator, outcome).await?,
            Err(e) => eprintln!("{} {e}", "Error:".red()),
        }
    }

    println!("Bye!");
    if let Some(ref path) = history_path {
        let _ = editor.save_history(path);
    }
    Ok(())
}
