// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Workspace root shared by the file tools.
//!
//! Every path an agent passes to a tool is resolved against the root and
//! normalised lexically. Anything that lands outside the root is rejected
//! with [`ToolError::SecurityViolation`].

use std::path::{Component, Path, PathBuf};

use crate::error::ToolError;

/// Directory the file tools are confined to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Confine tools to `root`. The root is canonicalised when it exists so
    /// that absolute paths produced from it compare equal.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let root = std::fs::canonicalize(&root).unwrap_or_else(|_| normalize(&root));
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a tool-supplied path to an absolute path inside the root.
    pub fn resolve(&self, path: &str) -> Result<PathBuf, ToolError> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return Err(ToolError::InvalidInput("path must not be empty".to_string()));
        }

        let candidate = Path::new(trimmed);
        let joined = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.root.join(candidate)
        };

        let resolved = normalize(&joined);
        if !resolved.starts_with(&self.root) {
            return Err(ToolError::SecurityViolation(format!(
                "path escapes the workspace: {trimmed}"
            )));
        }
        Ok(resolved)
    }

    /// Path relative to the root, for messages shown to the model.
    pub fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        match path.strip_prefix(&self.root) {
            Ok(rel) if rel.as_os_str().is_empty() => Path::new("."),
            Ok(rel) => rel,
            Err(_) => path,
        }
    }
}

/// Lexical normalisation: drops `.` and folds `..` into its parent.
/// A `..` at the root is kept, which makes the result fail the prefix check.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
