// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration type definitions.
//!
//! Defines the structure of workspace and resolved configuration,
//! supporting JSON and YAML formats.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::agents::DEFAULT_LEADER;
use crate::approval::ApprovalMode;
use crate::orchestrator::OrchestratorConfig;
use crate::providers::DEFAULT_BASE_URL;

/// Default cap on completion output tokens.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 4096;

/// Default per-call completion deadline in milliseconds.
pub const DEFAULT_COMPLETION_TIMEOUT_MS: u64 = 30_000;

/// Default tool-call ceiling per submitted instruction.
pub const DEFAULT_MAX_TOOL_CALLS: usize = 10;

/// Default delegation depth ceiling per submitted instruction.
pub const DEFAULT_MAX_DELEGATION_DEPTH: usize = 8;

/// Workspace configuration for huddle.
/// Can be defined in .huddle.json or .huddle/config.json in the project root.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceConfig {
    /// Base URL of the chat backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Bearer token for the chat backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Cap on output tokens per completion call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,

    /// Completion deadline in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_timeout_ms: Option<u64>,

    /// Tool-call ceiling per instruction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tool_calls: Option<usize>,

    /// Delegation depth ceiling per instruction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_delegation_depth: Option<usize>,

    /// How gated delegations are resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_mode: Option<ApprovalMode>,

    /// Agent that receives instructions without a mention
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_agent: Option<String>,

    /// Additional text to append to every agent's system prompt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt_additions: Option<String>,

    /// Root directory the file tools are confined to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,
}

/// Resolved configuration with all values set.
/// This is the merged result of global, workspace, local, and CLI configs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedConfig {
    pub base_url: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub max_output_tokens: u32,
    pub completion_timeout_ms: u64,
    pub max_tool_calls: usize,
    pub max_delegation_depth: usize,
    pub approval_mode: ApprovalMode,
    pub default_agent: String,
    pub system_prompt_additions: Option<String>,
    pub workspace_root: Option<PathBuf>,
}

impl ResolvedConfig {
    /// Loop limits and approval policy for the orchestrator.
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            max_tool_calls: self.max_tool_calls,
            max_delegation_depth: self.max_delegation_depth,
            completion_timeout: Duration::from_millis(self.completion_timeout_ms),
            max_output_tokens: self.max_output_tokens,
            approval_mode: self.approval_mode,
        }
    }

    /// Whether an API key is available, from config or the environment.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some() || std::env::var("HUDDLE_API_KEY").is_ok()
    }
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            completion_timeout_ms: DEFAULT_COMPLETION_TIMEOUT_MS,
            max_tool_calls: DEFAULT_MAX_TOOL_CALLS,
            max_delegation_depth: DEFAULT_MAX_DELEGATION_DEPTH,
            approval_mode: ApprovalMode::default(),
            default_agent: DEFAULT_LEADER.to_string(),
            system_prompt_additions: None,
            workspace_root: None,
        }
    }
}
