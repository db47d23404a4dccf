// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Agent registry: a fixed mapping from agent id to definition.

use std::collections::HashMap;

use super::builtin::{builtin_agents, DEFAULT_LEADER};
use super::AgentDefinition;

/// Registry of agents, keyed by id.
///
/// Built once through [`AgentRegistryBuilder`] and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct AgentRegistry {
    agents: HashMap<String, AgentDefinition>,
    /// Registration order, for stable listings.
    order: Vec<String>,
    default_agent: String,
}

impl AgentRegistry {
    /// Create a registry holding the built-in team.
    pub fn with_defaults() -> Self {
        let mut builder = AgentRegistryBuilder::new();
        for agent in builtin_agents() {
            builder.register(agent);
        }
        builder.default_agent(DEFAULT_LEADER);
        builder.build()
    }

    /// Get an agent by id.
    pub fn get(&self, id: &str) -> Option<&AgentDefinition> {
        self.agents.get(id)
    }

    /// Check if an agent exists.
    pub fn contains(&self, id: &str) -> bool {
        self.agents.contains_key(id)
    }

    /// Id of the agent that handles instructions without a mention.
    pub fn default_agent_id(&self) -> &str {
        &self.default_agent
    }

    /// All agents in registration order.
    pub fn agents(&self) -> impl Iterator<Item = &AgentDefinition> {
        self.order.iter().filter_map(|id| self.agents.get(id))
    }

    /// All agent ids in registration order.
    pub fn ids(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Whether handing work to `id` must pass the approval gate.
    pub fn is_execution_capable(&self, id: &str) -> bool {
        self.get(id).is_some_and(AgentDefinition::is_execution_capable)
    }

    /// Whether `from` may hand work to `to`. Both must exist.
    pub fn allows_delegation(&self, from: &str, to: &str) -> bool {
        self.contains(to) && self.get(from).is_some_and(|agent| agent.can_delegate_to(to))
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Builder for constructing an AgentRegistry.
pub struct AgentRegistryBuilder {
    agents: HashMap<String, AgentDefinition>,
    order: Vec<String>,
    default_agent: Option<String>,
    prompt_additions: Option<String>,
}

impl AgentRegistryBuilder {
    /// Create a new empty builder.
    pub fn new() -> Self {
        Self {
            agents: HashMap::new(),
            order: Vec::new(),
            default_agent: None,
            prompt_additions: None,
        }
    }

    /// Register an agent. Re-registering an id replaces the definition but
    /// keeps its original position.
    pub fn register(&mut self, agent: AgentDefinition) -> &mut Self {
        if !self.agents.contains_key(&agent.id) {
            self.order.push(agent.id.clone());
        }
        self.agents.insert(agent.id.clone(), agent);
        self
    }

    /// Set the agent that handles un-mentioned instructions.
    pub fn default_agent(&mut self, id: impl Into<String>) -> &mut Self {
        self.default_agent = Some(id.into().to_lowercase());
        self
    }

    /// Text appended to every agent's system prompt.
    pub fn prompt_additions(&mut self, additions: impl Into<String>) -> &mut Self {
        let additions = additions.into();
        if !additions.trim().is_empty() {
            self.prompt_additions = Some(additions);
        }
        self
    }

    /// Build the final registry.
    ///
    /// An unknown default agent falls back to the first registered agent.
    pub fn build(self) -> AgentRegistry {
        let Self {
            mut agents,
            order,
            default_agent,
            prompt_additions,
        } = self;

        if let Some(additions) = prompt_additions {
            for agent in agents.values_mut() {
                agent.system_prompt.push_str("\n\n");
                agent.system_prompt.push_str(&additions);
            }
        }

        let default_agent = default_agent
            .filter(|id| agents.contains_key(id))
            .or_else(|| order.first().cloned())
            .unwrap_or_default();

        AgentRegistry {
            agents,
            order,
            default_agent,
        }
    }
}

impl Default for AgentRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
