// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Tool registry consumed by the orchestrator.
//!
//! The orchestrator never implements tools; it looks them up by name and
//! invokes them. The pieces:
//!
//! - [`ToolHandler`] trait: one implementation per tool
//! - [`ToolRegistry`]: name to handler lookup, shared read-only across sessions
//! - [`Workspace`]: the root the built-in file tools are confined to
//!
//! ```rust,ignore
//! use huddle::tools::ToolRegistry;
//!
//! let registry = ToolRegistry::for_workspace(".");
//! let result = registry.invoke("read_file", json!({"path": "Cargo.toml"})).await;
//! ```

pub mod handlers;
pub mod registry;
mod workspace;

pub use handlers::*;
pub use registry::{DispatchResult, ToolHandler, ToolOutput, ToolRegistry, ToolRegistryBuilder};
pub use workspace::Workspace;

use serde::Deserialize;
use crate::error::ToolError;

/// Parse JSON arguments into a typed struct.
pub fn parse_arguments<T>(arguments: &serde_json::Value) -> Result<T, ToolError>
where
    T: for<'de> Deserialize<'de>,
{
    serde_json::from_value(arguments.clone())
        .map_err(|err| ToolError::InvalidInput(format!("Failed to parse arguments: {err}")))
}

/// Bytes of tool output kept in debug logs.
pub const TELEMETRY_PREVIEW_MAX_BYTES: usize = 512;

/// Largest tool result handed back to the model.
pub const MAX_RESULT_BYTES: usize = 64 * 1024;

/// Default number of lines `read_file` returns.
pub const DEFAULT_READ_LIMIT: usize = 2000;

/// Lines longer than this are clipped by `read_file`.
pub const MAX_LINE_LENGTH: usize = 2000;

/// Truncate text to a maximum byte length, respecting UTF-8 boundaries.
pub fn truncate_text(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }

    let mut end = max_bytes;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }

    format!("{}... [truncated]", &text[..end])
}
