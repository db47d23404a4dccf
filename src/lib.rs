// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! huddle - a small team of AI agents sharing one conversation.
//!
//! A user instruction is routed to one agent; agents answer, call tools, or
//! hand work to a teammate. Hand-overs to the engineer (the only agent that
//! edits the workspace) wait for human approval.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - [`types`] - Conversation messages, wire format, ephemeral requests
//! - [`error`] - Error types and result aliases
//! - [`config`] - Configuration loading and merging
//! - [`agents`] - Agent definitions and the registry
//! - [`router`] - Mention routing and hand-over parsing
//! - [`conversation`] - The shared conversation state
//! - [`approval`] - Approval gate for hand-overs to the engineer
//! - [`orchestrator`] - The turn loop state machine
//! - [`providers`] - Remote completion clients
//! - [`tools`] - Tool handlers and registry
//! - [`telemetry`] - Tracing setup and in-process metrics
//! - [`repl`] - Terminal front-end
//!
//! # Example
//!
//! ```rust,ignore
//! use huddle::config::{load_config, CliOptions};
//! use huddle::repl::build_orchestrator;
//!
//! let config = load_config(Path::new("."), CliOptions::default())?;
//! let mut orchestrator = build_orchestrator(&config, Default::default())?;
//! orchestrator.submit("@iris which crate should we use for HTTP?").await?;
//! ```

pub mod agents;
pub mod approval;
pub mod config;
pub mod conversation;
pub mod error;
pub mod orchestrator;
pub mod providers;
pub mod repl;
pub mod router;
pub mod telemetry;
pub mod tools;
pub mod types;

// Re-export commonly used types at crate root
pub use agents::{AgentDefinition, AgentRegistry, AgentRole};
pub use approval::{ApprovalMode, PendingApproval};
pub use conversation::ConversationState;
pub use error::{ConfigError, OrchestratorError, ProviderError, Result, ToolError};
pub use orchestrator::{
    Orchestrator, OrchestratorCallbacks, OrchestratorConfig, OrchestratorOptions, TurnOutcome,
    TurnStats,
};
pub use providers::{CompletionClient, HttpCompletionClient, SharedClient};
pub use router::{parse_delegation, DelegationRouter};
pub use tools::ToolRegistry;
pub use types::{
    CompletionRequest, CompletionResponse, ContentSegment, ConversationMessage,
    DelegationRequest, Role, TokenUsage, ToolInvocationRequest,
};

/// huddle version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
