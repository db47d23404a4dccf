// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration loading from files.
//!
//! Handles loading configuration from JSON and YAML files in various locations.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

use super::types::{
    WorkspaceConfig, DEFAULT_COMPLETION_TIMEOUT_MS, DEFAULT_MAX_DELEGATION_DEPTH,
    DEFAULT_MAX_TOOL_CALLS,
};
use crate::approval::ApprovalMode;
use crate::providers::DEFAULT_BASE_URL;

/// Config file names to search for (in order).
pub const CONFIG_FILES: &[&str] = &[".huddle.json", ".huddle/config.json", "huddle.config.json"];

/// Local config file name (for per-directory overrides).
pub const LOCAL_CONFIG_FILE: &str = ".huddle.local.json";

/// Global config directory name.
pub const GLOBAL_CONFIG_DIR: &str = ".huddle";

/// Global config file name.
pub const GLOBAL_CONFIG_FILE: &str = "config.json";

/// `~/.huddle`, when a home directory is known.
pub fn get_global_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(GLOBAL_CONFIG_DIR))
}

pub fn get_global_config_path() -> Option<PathBuf> {
    get_global_config_dir().map(|dir| dir.join(GLOBAL_CONFIG_FILE))
}

/// Parse `path` if it exists; a missing file is not an error.
fn load_if_present(path: &Path) -> Result<Option<WorkspaceConfig>, ConfigError> {
    if path.is_file() {
        load_config_file(path).map(Some)
    } else {
        Ok(None)
    }
}

/// Layer shared by every workspace on this machine.
pub fn load_global_config() -> Result<Option<WorkspaceConfig>, ConfigError> {
    match get_global_config_path() {
        Some(path) => load_if_present(&path),
        None => Ok(None),
    }
}

/// The first of [`CONFIG_FILES`] present in `workspace_root`. Later names are
/// not consulted once one is found.
pub fn load_workspace_config(workspace_root: &Path) -> Result<Option<WorkspaceConfig>, ConfigError> {
    match CONFIG_FILES
        .iter()
        .map(|name| workspace_root.join(name))
        .find(|path| path.is_file())
    {
        Some(path) => load_config_file(&path).map(Some),
        None => Ok(None),
    }
}

/// Personal overrides, usually gitignored.
pub fn load_local_config(workspace_root: &Path) -> Result<Option<WorkspaceConfig>, ConfigError> {
    load_if_present(&workspace_root.join(LOCAL_CONFIG_FILE))
}

/// Parse one config file. `.yaml`/`.yml` are read as YAML, anything else as
/// JSON.
pub fn load_config_file(path: &Path) -> Result<WorkspaceConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    if is_yaml {
        Ok(serde_yaml::from_str(&content)?)
    } else {
        Ok(serde_json::from_str(&content)?)
    }
}

/// Save workspace configuration to a file.
pub fn save_workspace_config(
    workspace_root: &Path,
    config: &WorkspaceConfig,
    filename: Option<&str>,
) -> Result<PathBuf, ConfigError> {
    let filename = filename.unwrap_or(CONFIG_FILES[0]);
    let path = workspace_root.join(filename);

    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, content)?;

    Ok(path)
}

/// Write a starter `.huddle.json`. Refuses to overwrite an existing file.
pub fn init_config(
    workspace_root: &Path,
    config: Option<WorkspaceConfig>,
) -> Result<PathBuf, ConfigError> {
    let target = workspace_root.join(CONFIG_FILES[0]);
    if target.exists() {
        return Err(ConfigError::InvalidValue {
            field: CONFIG_FILES[0].to_string(),
            message: format!("{} already exists", target.display()),
        });
    }
    let config = config.unwrap_or_else(get_example_config);
    save_workspace_config(workspace_root, &config, None)
}

/// Nearest directory at or above `start` that holds one of [`CONFIG_FILES`].
pub fn find_workspace_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| CONFIG_FILES.iter().any(|name| dir.join(name).is_file()))
        .map(Path::to_path_buf)
}

/// Starter file written by `huddle init`: every tunable at its default.
pub fn get_example_config() -> WorkspaceConfig {
    WorkspaceConfig {
        base_url: Some(DEFAULT_BASE_URL.to_string()),
        completion_timeout_ms: Some(DEFAULT_COMPLETION_TIMEOUT_MS),
        max_tool_calls: Some(DEFAULT_MAX_TOOL_CALLS),
        max_delegation_depth: Some(DEFAULT_MAX_DELEGATION_DEPTH),
        approval_mode: Some(ApprovalMode::Interactive),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_files_order() {
        assert_eq!(CONFIG_FILES.len(), 3);
        assert_eq!(CONFIG_FILES[0], ".huddle.json");
    }

    #[test]
    fn test_global_config_dir() {
        if let Some(dir) = get_global_config_dir() {
            assert!(dir.ends_with(".huddle"));
        }
    }

    #[test]
    fn test_load_workspace_config_not_found() {
        let temp = TempDir::new().unwrap();
        let result = load_workspace_config(temp.path()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_load_workspace_config_json() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(".huddle.json"),
            r#"{"baseUrl": "http://chat:9000", "maxToolCalls": 5}"#,
        )
        .unwrap();

        let config = load_workspace_config(temp.path()).unwrap().unwrap();
        assert_eq!(config.base_url.as_deref(), Some("http://chat:9000"));
        assert_eq!(config.max_tool_calls, Some(5));
    }

    #[test]
    fn test_load_workspace_config_nested_dir() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join(".huddle")).unwrap();
        std::fs::write(
            temp.path().join(".huddle/config.json"),
            r#"{"defaultAgent": "emma"}"#,
        )
        .unwrap();

        let config = load_workspace_config(temp.path()).unwrap().unwrap();
        assert_eq!(config.default_agent.as_deref(), Some("emma"));
    }

    #[test]
    fn test_load_config_file_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("team.yaml");
        std::fs::write(&path, "approvalMode: autoApprove\ncompletionTimeoutMs: 1500\n").unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.approval_mode, Some(ApprovalMode::AutoApprove));
        assert_eq!(config.completion_timeout_ms, Some(1500));
    }

    #[test]
    fn test_load_config_file_invalid_json() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".huddle.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(load_config_file(&path), Err(ConfigError::JsonError(_))));
    }

    #[test]
    fn test_save_workspace_config() {
        let temp = TempDir::new().unwrap();
        let config = WorkspaceConfig {
            default_agent: Some("iris".to_string()),
            ..Default::default()
        };

        let saved_path = save_workspace_config(temp.path(), &config, None).unwrap();
        assert!(saved_path.exists());

        let content = std::fs::read_to_string(&saved_path).unwrap();
        assert!(content.contains("\"defaultAgent\": \"iris\""));
    }

    #[test]
    fn test_find_workspace_root() {
        let temp = TempDir::new().unwrap();
        let subdir = temp.path().join("a").join("b").join("c");
        std::fs::create_dir_all(&subdir).unwrap();
        std::fs::write(temp.path().join(".huddle.json"), "{}").unwrap();

        let found = find_workspace_root(&subdir);
        assert_eq!(found.as_deref(), Some(temp.path()));
    }

    #[test]
    fn test_init_config() {
        let temp = TempDir::new().unwrap();
        let path = init_config(temp.path(), None).unwrap();
        assert_eq!(path.file_name().unwrap(), ".huddle.json");

        let loaded = load_config_file(&path).unwrap();
        assert_eq!(loaded.max_tool_calls, Some(DEFAULT_MAX_TOOL_CALLS));

        let again = init_config(temp.path(), None);
        assert!(matches!(again, Err(ConfigError::InvalidValue { .. })));
    }
}
