// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! `read_file`: read a workspace file with line numbers.

use async_trait::async_trait;
use serde::Deserialize;

#[cfg(feature = "telemetry")]
use tracing::{debug, instrument};

use crate::error::ToolError;
use crate::tools::registry::{ToolHandler, ToolOutput};
use crate::tools::{parse_arguments, Workspace, DEFAULT_READ_LIMIT, MAX_LINE_LENGTH};
use crate::types::{InputSchema, ToolDefinition};

/// Handler for the `read_file` tool.
pub struct ReadFileHandler {
    workspace: Workspace,
}

impl ReadFileHandler {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }
}

#[derive(Debug, Deserialize)]
struct ReadFileArgs {
    /// Path relative to the workspace root.
    path: String,
    /// 1-indexed first line.
    #[serde(default = "default_offset")]
    offset: usize,
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_offset() -> usize {
    1
}

fn default_limit() -> usize {
    DEFAULT_READ_LIMIT
}

#[async_trait]
impl ToolHandler for ReadFileHandler {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("read_file", "Read a file from the workspace, with line numbers")
            .with_schema(
                InputSchema::new()
                    .with_property("path", serde_json::json!({
                        "type": "string",
                        "description": "Path relative to the workspace root"
                    }))
                    .with_property("offset", serde_json::json!({
                        "type": "integer",
                        "description": "1-indexed line to start from (default: 1)"
                    }))
                    .with_property("limit", serde_json::json!({
                        "type": "integer",
                        "description": "Maximum number of lines (default: 2000)"
                    }))
                    .with_required(vec!["path".to_string()]),
            )
    }

    #[cfg_attr(feature = "telemetry", instrument(skip(self, input), fields(path, lines)))]
    async fn execute(&self, input: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let args: ReadFileArgs = parse_arguments(&input)?;

        #[cfg(feature = "telemetry")]
        tracing::Span::current().record("path", args.path.as_str());

        if args.offset == 0 {
            return Err(ToolError::InvalidInput("offset is 1-indexed".to_string()));
        }
        if args.limit == 0 {
            return Err(ToolError::InvalidInput("limit must be greater than zero".to_string()));
        }

        let path = self.workspace.resolve(&args.path)?;
        let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ToolError::FileNotFound(args.path.clone()),
            std::io::ErrorKind::PermissionDenied => ToolError::PermissionDenied(args.path.clone()),
            _ => ToolError::IoError(format!("Failed to read {}: {e}", args.path)),
        })?;

        let text = String::from_utf8_lossy(&bytes);
        let total = text.lines().count();
        if total > 0 && args.offset > total {
            return Err(ToolError::InvalidInput(format!(
                "offset {} is past the end of the file ({total} lines)",
                args.offset
            )));
        }

        let numbered: Vec<String> = text
            .lines()
            .enumerate()
            .skip(args.offset - 1)
            .take(args.limit)
            .map(|(i, line)| format!("{:>5}| {}", i + 1, clip_line(line)))
            .collect();

        #[cfg(feature = "telemetry")]
        {
            tracing::Span::current().record("lines", numbered.len());
            debug!(path = %args.path, lines = numbered.len(), "File read");
        }

        if numbered.is_empty() {
            return Ok(ToolOutput::success("[empty file]"));
        }

        let mut content = numbered.join("\n");
        let shown_to = args.offset - 1 + numbered.len();
        if shown_to < total {
            content.push_str(&format!("\n[{} more lines]", total - shown_to));
        }
        Ok(ToolOutput::success(content))
    }
}

fn clip_line(line: &str) -> String {
    let line = line.strip_suffix('\r').unwrap_or(line);
    if line.len() <= MAX_LINE_LENGTH {
        return line.to_string();
    }
    let mut end = MAX_LINE_LENGTH;
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &line[..end])
}
