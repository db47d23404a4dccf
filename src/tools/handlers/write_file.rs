// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! `write_file`: create or overwrite a workspace file.

use async_trait::async_trait;
use serde::Deserialize;
use tokio::fs;

#[cfg(feature = "telemetry")]
use tracing::{debug, instrument};

use crate::error::ToolError;
use crate::tools::registry::{ToolHandler, ToolOutput};
use crate::tools::{parse_arguments, Workspace};
use crate::types::{InputSchema, ToolDefinition};

/// Handler for the `write_file` tool.
pub struct WriteFileHandler {
    workspace: Workspace,
}

impl WriteFileHandler {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }
}

#[derive(Debug, Deserialize)]
struct WriteFileArgs {
    path: String,
    content: String,
}

#[async_trait]
impl ToolHandler for WriteFileHandler {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "write_file",
            "Write a file in the workspace, creating parent directories as needed",
        )
        .with_schema(
            InputSchema::new()
                .with_property("path", serde_json::json!({
                    "type": "string",
                    "description": "Path relative to the workspace root"
                }))
                .with_property("content", serde_json::json!({
                    "type": "string",
                    "description": "Full new content of the file"
                }))
                .with_required(vec!["path".to_string(), "content".to_string()]),
        )
    }

    fn is_mutating(&self) -> bool {
        true
    }

    #[cfg_attr(feature = "telemetry", instrument(skip(self, input), fields(path, bytes)))]
    async fn execute(&self, input: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let args: WriteFileArgs = parse_arguments(&input)?;
        let path = self.workspace.resolve(&args.path)?;

        #[cfg(feature = "telemetry")]
        {
            let span = tracing::Span::current();
            span.record("path", args.path.as_str());
            span.record("bytes", args.content.len());
        }

        if path.is_dir() {
            return Err(ToolError::InvalidInput(format!("{} is a directory", args.path)));
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                ToolError::IoError(format!("Failed to create parent directories: {e}"))
            })?;
        }

        let existed = fs::try_exists(&path).await.unwrap_or(false);
        fs::write(&path, &args.content).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => ToolError::PermissionDenied(args.path.clone()),
            _ => ToolError::IoError(format!("Failed to write {}: {e}", args.path)),
        })?;

        let action = if existed { "Updated" } else { "Created" };
        let lines = args.content.lines().count();

        #[cfg(feature = "telemetry")]
        debug!(path = %args.path, lines, created = !existed, "File written");

        Ok(ToolOutput::success(format!(
            "{action} {} ({lines} lines, {} bytes)",
            self.workspace.relative(&path).display(),
            args.content.len()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_write_file_creates_nested() {
        let temp = tempdir().unwrap();
        let handler = WriteFileHandler::new(Workspace::new(temp.path()));

        let output = handler
            .execute(serde_json::json!({
                "path": "src/ui/header.rs",
                "content": "pub fn login_button() {}\n"
            }))
            .await
            .unwrap();

        assert!(output.is_success());
        assert!(output.content().starts_with("Created src/ui/header.rs"));
        let written = std::fs::read_to_string(temp.path().join("src/ui/header.rs")).unwrap();
        assert_eq!(written, "pub fn login_button() {}\n");
    }

    #[tokio::test]
    async fn test_write_file_overwrites() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join("a.txt"), "old").unwrap();
        let handler = WriteFileHandler::new(Workspace::new(temp.path()));

        let output = handler
            .execute(serde_json::json!({"path": "a.txt", "content": "new"}))
            .await
            .unwrap();

        assert!(output.content().starts_with("Updated a.txt"));
        assert_eq!(std::fs::read_to_string(temp.path().join("a.txt")).unwrap(), "new");
    }

    #[tokio::test]
    async fn test_write_file_outside_workspace() {
        let temp = tempdir().unwrap();
        let handler = WriteFileHandler::new(Workspace::new(temp.path().join("inner")));

        let err = handler
            .execute(serde_json::json!({"path": "../escape.txt", "content": "x"}))
            .await
            .unwrap_err();

        assert!(matches!(err, ToolError::SecurityViolation(_)));
        assert!(!temp.path().join("escape.txt").exists());
    }

    #[tokio::test]
    async fn test_write_file_missing_content() {
        let temp = tempdir().unwrap();
        let handler = WriteFileHandler::new(Workspace::new(temp.path()));
        let err = handler
            .execute(serde_json::json!({"path": "a.txt"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }

    #[test]
    fn test_write_file_is_mutating() {
        let temp = tempdir().unwrap();
        assert!(WriteFileHandler::new(Workspace::new(temp.path())).is_mutating());
    }
}
