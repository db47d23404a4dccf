// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration module for huddle.
//!
//! Handles loading and merging of configuration from multiple sources:
//! - Global config: ~/.huddle/config.json
//! - Workspace config: .huddle.json, .huddle/config.json, or huddle.config.json
//! - Local config: .huddle.local.json (gitignored, for personal overrides)
//! - CLI options: command-line arguments
//!
//! Configuration is merged with precedence (CLI > local > workspace > global > defaults).

mod loader;
mod merger;
mod types;

pub use loader::{
    find_workspace_root, get_example_config, get_global_config_dir, get_global_config_path,
    init_config, load_config_file, load_global_config, load_local_config, load_workspace_config,
    save_workspace_config, CONFIG_FILES, GLOBAL_CONFIG_DIR, GLOBAL_CONFIG_FILE, LOCAL_CONFIG_FILE,
};

pub use merger::{default_config, merge_config, CliOptions};

pub use types::{
    ResolvedConfig, WorkspaceConfig, DEFAULT_COMPLETION_TIMEOUT_MS, DEFAULT_MAX_DELEGATION_DEPTH,
    DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_MAX_TOOL_CALLS,
};

use crate::error::ConfigError;
use std::path::Path;

/// Load and merge all configuration sources for a workspace.
///
/// This is the main entry point for configuration loading.
pub fn load_config(
    workspace_root: &Path,
    cli_options: CliOptions,
) -> Result<ResolvedConfig, ConfigError> {
    let global = load_global_config()?;
    let workspace = load_workspace_config(workspace_root)?;
    let local = load_local_config(workspace_root)?;

    Ok(merge_config(global, workspace, local, cli_options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_config_with_no_files() {
        let temp = TempDir::new().unwrap();
        let config = load_config(temp.path(), CliOptions::default()).unwrap();
        assert!(!config.base_url.is_empty());
    }

    #[test]
    fn test_load_config_local_overrides_workspace() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(".huddle.json"),
            r#"{"maxDelegationDepth": 4, "completionTimeoutMs": 1000}"#,
        )
        .unwrap();
        std::fs::write(
            temp.path().join(".huddle.local.json"),
            r#"{"completionTimeoutMs": 2000}"#,
        )
        .unwrap();

        let config = load_config(temp.path(), CliOptions::default()).unwrap();
        assert_eq!(config.max_delegation_depth, 4);
        assert_eq!(config.completion_timeout_ms, 2000);
    }

    #[test]
    fn test_load_config_cli_override() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(".huddle.json"),
            r#"{"maxToolCalls": 3}"#,
        )
        .unwrap();

        let cli = CliOptions {
            max_tool_calls: Some(7),
            ..Default::default()
        };

        let config = load_config(temp.path(), cli).unwrap();
        assert_eq!(config.max_tool_calls, 7); // CLI wins
    }

    #[test]
    fn test_load_config_reports_bad_file() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(".huddle.json"), "[1, 2").unwrap();
        assert!(load_config(temp.path(), CliOptions::default()).is_err());
    }
}
