// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Agent definitions and the registry that holds them.
//!
//! An agent is a named role with a fixed system prompt, a tool permission and
//! a list of agents it is allowed to hand work to. The registry is built once
//! and then shared read-only (behind an `Arc`) by every session.
//!
//! # Example
//!
//! ```rust,ignore
//! use huddle::agents::AgentRegistry;
//!
//! let registry = AgentRegistry::with_defaults();
//! assert_eq!(registry.default_agent_id(), "mike");
//! assert!(registry.is_execution_capable("alex"));
//! ```

mod builtin;
mod registry;

pub use builtin::{builtin_agents, DEFAULT_LEADER};
pub use registry::{AgentRegistry, AgentRegistryBuilder};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Role label of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    TeamLeader,
    ProductManager,
    Researcher,
    Reviewer,
    Engineer,
}

impl AgentRole {
    /// Agents in this role act on the workspace, so handing work to them is
    /// gated behind human approval.
    pub fn is_execution_capable(&self) -> bool {
        matches!(self, AgentRole::Engineer)
    }

    pub fn label(&self) -> &'static str {
        match self {
            AgentRole::TeamLeader => "Team Leader",
            AgentRole::ProductManager => "Product Manager",
            AgentRole::Researcher => "Researcher",
            AgentRole::Reviewer => "Code Reviewer",
            AgentRole::Engineer => "Engineer",
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Immutable definition of one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDefinition {
    /// Identity, lowercase (also the mention handle: `@alex`).
    pub id: String,
    /// Display name.
    pub name: String,
    pub role: AgentRole,
    pub system_prompt: String,
    pub can_use_tools: bool,
    /// Agents this one may delegate to.
    pub delegates_to: BTreeSet<String>,
}

impl AgentDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: AgentRole) -> Self {
        Self {
            id: id.into().to_lowercase(),
            name: name.into(),
            role,
            system_prompt: String::new(),
            can_use_tools: false,
            delegates_to: BTreeSet::new(),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_tools(mut self, can_use_tools: bool) -> Self {
        self.can_use_tools = can_use_tools;
        self
    }

    pub fn delegating_to<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.delegates_to = targets.into_iter().map(|t| t.into().to_lowercase()).collect();
        self
    }

    pub fn can_delegate_to(&self, target: &str) -> bool {
        self.delegates_to.contains(target)
    }

    pub fn is_execution_capable(&self) -> bool {
        self.role.is_execution_capable()
    }
}
