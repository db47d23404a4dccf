// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Tool registry and handler trait.
//!
//! - [`ToolHandler`]: what every tool implements
//! - [`ToolRegistry`]: name to handler lookup and invocation
//! - [`ToolOutput`]: the text a tool hands back

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(feature = "telemetry")]
use tracing::{debug, info_span, Instrument};

use super::{truncate_text, Workspace, MAX_RESULT_BYTES};
use crate::error::ToolError;
#[cfg(feature = "telemetry")]
use crate::telemetry::metrics::GLOBAL_METRICS;
use crate::types::ToolDefinition;

/// Result text of a tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    content: String,
    success: bool,
}

impl ToolOutput {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            success: true,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            success: false,
        }
    }

    /// Structured `{"error": ...}` payload, the shape the model sees for
    /// every failure.
    pub fn error_payload(message: impl AsRef<str>) -> Self {
        Self::error(serde_json::json!({ "error": message.as_ref() }).to_string())
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn into_content(self) -> String {
        self.content
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Get a preview suitable for logging (truncated).
    pub fn log_preview(&self, max_bytes: usize) -> String {
        truncate_text(&self.content, max_bytes)
    }
}

impl From<ToolError> for ToolOutput {
    fn from(err: ToolError) -> Self {
        Self::error_payload(err.to_string())
    }
}

/// Trait that all tool handlers must implement.
///
/// ```rust,ignore
/// struct Echo;
///
/// #[async_trait]
/// impl ToolHandler for Echo {
///     fn definition(&self) -> ToolDefinition {
///         ToolDefinition::new("echo", "Echo the input back")
///     }
///
///     async fn execute(&self, input: serde_json::Value) -> Result<ToolOutput, ToolError> {
///         Ok(ToolOutput::success(input.to_string()))
///     }
/// }
/// ```
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Get the tool definition (name, description, input schema).
    fn definition(&self) -> ToolDefinition;

    /// Whether the tool changes the workspace.
    fn is_mutating(&self) -> bool {
        false
    }

    /// Execute the tool with the given input parameters.
    async fn execute(&self, input: serde_json::Value) -> Result<ToolOutput, ToolError>;
}

/// Registry of available tools. Immutable once built and safe to share.
pub struct ToolRegistry {
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registry with the built-in file tools confined to `root`.
    pub fn for_workspace(root: impl Into<PathBuf>) -> Self {
        let workspace = Workspace::new(root);
        let mut builder = ToolRegistryBuilder::new();
        builder.register(super::handlers::ReadFileHandler::new(workspace.clone()));
        builder.register(super::handlers::WriteFileHandler::new(workspace.clone()));
        builder.register(super::handlers::ListDirHandler::new(workspace));
        builder.build()
    }

    /// Get a handler by tool name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.handlers.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// All tool definitions, sorted by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self.handlers.values().map(|h| h.definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// All tool names, sorted.
    pub fn tool_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Run a tool and report what happened.
    ///
    /// Never fails: a missing tool yields `{"error":"Tool not found"}` and a
    /// handler error yields `{"error":"<reason>"}`, both flagged `is_error`.
    /// Oversized output is truncated before it goes back to the model.
    pub async fn invoke(&self, tool_name: &str, input: serde_json::Value) -> DispatchResult {
        let Some(handler) = self.get(tool_name) else {
            #[cfg(feature = "telemetry")]
            debug!(tool = %tool_name, "Tool not found");
            return DispatchResult {
                tool_name: tool_name.to_string(),
                output: ToolOutput::error_payload("Tool not found"),
                duration: Duration::ZERO,
                is_error: true,
            };
        };

        #[cfg(feature = "telemetry")]
        debug!(tool = %tool_name, mutating = handler.is_mutating(), "Executing tool");

        let start = Instant::now();

        #[cfg(feature = "telemetry")]
        let result = handler
            .execute(input)
            .instrument(info_span!("tool_execute", tool = %tool_name))
            .await;

        #[cfg(not(feature = "telemetry"))]
        let result = handler.execute(input).await;

        let duration = start.elapsed();
        let is_error = result.is_err();

        #[cfg(feature = "telemetry")]
        GLOBAL_METRICS.record_tool(tool_name, duration, !is_error);

        let output = match result {
            Ok(output) if output.content().len() > MAX_RESULT_BYTES => {
                let success = output.is_success();
                let clipped = truncate_text(output.content(), MAX_RESULT_BYTES);
                if success {
                    ToolOutput::success(clipped)
                } else {
                    ToolOutput::error(clipped)
                }
            }
            Ok(output) => output,
            Err(err) => ToolOutput::from(err),
        };

        #[cfg(feature = "telemetry")]
        debug!(
            tool = %tool_name,
            duration_ms = duration.as_secs_f64() * 1000.0,
            is_error,
            preview = %output.log_preview(super::TELEMETRY_PREVIEW_MAX_BYTES),
            "Tool finished"
        );

        DispatchResult {
            tool_name: tool_name.to_string(),
            is_error: is_error || !output.is_success(),
            output,
            duration,
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of one [`ToolRegistry::invoke`] call.
#[derive(Debug)]
pub struct DispatchResult {
    pub tool_name: String,
    pub output: ToolOutput,
    pub duration: Duration,
    pub is_error: bool,
}

/// Builder for constructing a ToolRegistry.
pub struct ToolRegistryBuilder {
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
}

impl ToolRegistryBuilder {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a tool handler. A later handler with the same name wins.
    pub fn register<T: ToolHandler + 'static>(&mut self, handler: T) -> &mut Self {
        self.register_shared(Arc::new(handler))
    }

    pub fn register_shared(&mut self, handler: Arc<dyn ToolHandler>) -> &mut Self {
        let def = handler.definition();
        self.handlers.insert(def.name, handler);
        self
    }

    pub fn build(self) -> ToolRegistry {
        ToolRegistry {
            handlers: self.handlers,
        }
    }
}

impl Default for ToolRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    #[async_trait]
    impl ToolHandler for EchoTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition::new("echo", "Echo the input")
        }

        async fn execute(&self, input: serde_json::Value) -> Result<ToolOutput, ToolError> {
            match input.get("text").and_then(|v| v.as_str()) {
                Some(text) => Ok(ToolOutput::success(text)),
                None => Err(ToolError::InvalidInput("text is required".to_string())),
            }
        }
    }

    fn echo_registry() -> ToolRegistry {
        let mut builder = ToolRegistryBuilder::new();
        builder.register(EchoTool);
        builder.build()
    }

    #[tokio::test]
    async fn test_invoke_success() {
        let result = echo_registry()
            .invoke("echo", serde_json::json!({"text": "hi"}))
            .await;
        assert!(!result.is_error);
        assert_eq!(result.output.content(), "hi");
        assert_eq!(result.tool_name, "echo");
    }

    #[tokio::test]
    async fn test_invoke_missing_tool_is_structured() {
        let result = ToolRegistry::new().invoke("deploy", serde_json::json!({})).await;
        assert!(result.is_error);
        let payload: serde_json::Value = serde_json::from_str(result.output.content()).unwrap();
        assert_eq!(payload, serde_json::json!({"error": "Tool not found"}));
    }

    #[tokio::test]
    async fn test_invoke_handler_error_is_structured() {
        let result = echo_registry().invoke("echo", serde_json::json!({})).await;
        assert!(result.is_error);
        let payload: serde_json::Value = serde_json::from_str(result.output.content()).unwrap();
        assert!(payload["error"].as_str().unwrap().contains("text is required"));
    }

    #[tokio::test]
    async fn test_invoke_truncates_large_output() {
        let big = "x".repeat(MAX_RESULT_BYTES + 10);
        let result = echo_registry()
            .invoke("echo", serde_json::json!({"text": big}))
            .await;
        assert!(result.output.content().ends_with("[truncated]"));
        assert!(!result.is_error);
    }

    #[test]
    fn test_for_workspace_registers_file_tools() {
        let temp = tempfile::tempdir().unwrap();
        let registry = ToolRegistry::for_workspace(temp.path());
        assert_eq!(registry.tool_names(), vec!["list_directory", "read_file", "write_file"]);
        assert_eq!(registry.definitions().len(), 3);
        assert!(registry.get("write_file").unwrap().is_mutating());
        assert!(!registry.get("read_file").unwrap().is_mutating());
    }
}
