// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! `list_directory`: list a workspace directory.

use async_trait::async_trait;
use serde::Deserialize;
use tokio::fs;

#[cfg(feature = "telemetry")]
use tracing::{debug, instrument};

use crate::error::ToolError;
use crate::tools::registry::{ToolHandler, ToolOutput};
use crate::tools::{parse_arguments, Workspace};
use crate::types::{InputSchema, ToolDefinition};

const DEFAULT_LIMIT: usize = 200;

/// Handler for the `list_directory` tool.
pub struct ListDirHandler {
    workspace: Workspace,
}

impl ListDirHandler {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }
}

#[derive(Debug, Deserialize)]
struct ListDirArgs {
    #[serde(default = "default_path")]
    path: String,
    #[serde(default = "default_limit")]
    limit: usize,
    #[serde(default)]
    show_hidden: bool,
}

fn default_path() -> String {
    ".".to_string()
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

#[async_trait]
impl ToolHandler for ListDirHandler {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("list_directory", "List a directory in the workspace")
            .with_schema(
                InputSchema::new()
                    .with_property("path", serde_json::json!({
                        "type": "string",
                        "description": "Directory relative to the workspace root (default: the root)"
                    }))
                    .with_property("limit", serde_json::json!({
                        "type": "integer",
                        "description": "Maximum number of entries (default: 200)"
                    }))
                    .with_property("show_hidden", serde_json::json!({
                        "type": "boolean",
                        "description": "Include dotfiles (default: false)"
                    })),
            )
    }

    #[cfg_attr(feature = "telemetry", instrument(skip(self, input), fields(path, entries)))]
    async fn execute(&self, input: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let args: ListDirArgs = parse_arguments(&input)?;
        let dir = self.workspace.resolve(&args.path)?;

        #[cfg(feature = "telemetry")]
        tracing::Span::current().record("path", args.path.as_str());

        let metadata = fs::metadata(&dir).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ToolError::FileNotFound(args.path.clone()),
            _ => ToolError::IoError(format!("Failed to access {}: {e}", args.path)),
        })?;
        if !metadata.is_dir() {
            return Err(ToolError::InvalidInput(format!("{} is not a directory", args.path)));
        }

        let mut reader = fs::read_dir(&dir)
            .await
            .map_err(|e| ToolError::IoError(format!("Failed to read directory: {e}")))?;

        let mut entries: Vec<(bool, String)> = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| ToolError::IoError(format!("Failed to read directory entry: {e}")))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !args.show_hidden && name.starts_with('.') {
                continue;
            }
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            entries.push((is_dir, name));
        }

        // Directories first, then case-insensitive by name.
        entries.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.to_lowercase().cmp(&b.1.to_lowercase())));

        let total = entries.len();
        let mut lines: Vec<String> = entries
            .into_iter()
            .take(args.limit)
            .map(|(is_dir, name)| if is_dir { format!("{name}/") } else { name })
            .collect();

        #[cfg(feature = "telemetry")]
        {
            tracing::Span::current().record("entries", total);
            debug!(path = %args.path, entries = total, "Directory listed");
        }

        if lines.is_empty() {
            return Ok(ToolOutput::success("[empty directory]"));
        }
        if total > lines.len() {
            lines.push(format!("[{} more entries]", total - lines.len()));
        }
        Ok(ToolOutput::success(lines.join("\n")))
    }
}
