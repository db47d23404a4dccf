// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration merging.
//!
//! Handles merging configurations from different sources with proper precedence.

use std::path::PathBuf;

use super::types::{ResolvedConfig, WorkspaceConfig};
use crate::approval::ApprovalMode;

/// CLI options that can override configuration.
#[derive(Debug, Clone, Default)]
pub struct CliOptions {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_ms: Option<u64>,
    pub max_tool_calls: Option<usize>,
    pub approval_mode: Option<ApprovalMode>,
    pub workspace_root: Option<PathBuf>,
}

/// Default configuration values.
pub fn default_config() -> ResolvedConfig {
    ResolvedConfig::default()
}

/// Merge multiple configurations with precedence.
///
/// Precedence (highest to lowest):
/// 1. CLI options
/// 2. Local config (.huddle.local.json)
/// 3. Workspace config (.huddle.json)
/// 4. Global config (~/.huddle/config.json)
/// 5. Default values
pub fn merge_config(
    global: Option<WorkspaceConfig>,
    workspace: Option<WorkspaceConfig>,
    local: Option<WorkspaceConfig>,
    cli: CliOptions,
) -> ResolvedConfig {
    let mut result = default_config();

    for config in [global, workspace, local].into_iter().flatten() {
        apply_workspace_config(&mut result, &config);
    }

    // Apply CLI options (highest precedence)
    apply_cli_options(&mut result, &cli);

    result
}

fn apply_workspace_config(result: &mut ResolvedConfig, config: &WorkspaceConfig) {
    if let Some(ref base_url) = config.base_url {
        result.base_url = base_url.clone();
    }

    if config.api_key.is_some() {
        result.api_key = config.api_key.clone();
    }

    if let Some(max) = config.max_output_tokens {
        result.max_output_tokens = max;
    }

    if let Some(timeout) = config.completion_timeout_ms {
        result.completion_timeout_ms = timeout;
    }

    if let Some(max) = config.max_tool_calls {
        result.max_tool_calls = max;
    }

    if let Some(depth) = config.max_delegation_depth {
        result.max_delegation_depth = depth;
    }

    if let Some(mode) = config.approval_mode {
        result.approval_mode = mode;
    }

    if let Some(ref agent) = config.default_agent {
        result.default_agent = agent.to_lowercase();
    }

    // Prompt additions stack: global first, then workspace, then local.
    if let Some(ref additions) = config.system_prompt_additions {
        result.system_prompt_additions = Some(match result.system_prompt_additions.take() {
            Some(existing) => format!("{existing}\n\n{additions}"),
            None => additions.clone(),
        });
    }

    if config.workspace_root.is_some() {
        result.workspace_root = config.workspace_root.clone();
    }
}

fn apply_cli_options(result: &mut ResolvedConfig, cli: &CliOptions) {
    if let Some(ref base_url) = cli.base_url {
        result.base_url = base_url.clone();
    }

    if cli.api_key.is_some() {
        result.api_key = cli.api_key.clone();
    }

    if let Some(timeout) = cli.timeout_ms {
        result.completion_timeout_ms = timeout;
    }

    if let Some(max) = cli.max_tool_calls {
        result.max_tool_calls = max;
    }

    if let Some(mode) = cli.approval_mode {
        result.approval_mode = mode;
    }

    if cli.workspace_root.is_some() {
        result.workspace_root = cli.workspace_root.clone();
    }
}
