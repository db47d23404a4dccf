// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Delegation routing.
//!
//! Two pure functions live here:
//!
//! - [`DelegationRouter::route`] picks the agent that receives the first turn
//!   for a raw user instruction, based on mention markers.
//! - [`parse_delegation`] recognises a hand-over in an agent's own output,
//!   in either the `DELEGATE_TO:<agent>\n<brief>` or the `@<agent> <brief>`
//!   form.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::agents::{AgentRegistry, DEFAULT_LEADER};
use crate::types::DelegationRequest;

/// Mention markers in priority order. The first one present wins.
pub const MENTION_PRIORITY: &[&str] = &["alex", "iris", "emma", "sarah"];

static DELEGATE_TO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)DELEGATE_TO:[ \t]*@?([a-z0-9_-]+)[ \t]*\r?\n(.*)").expect("valid regex")
});

static MENTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)(?:^|\s)@([a-z0-9_-]+)[ \t]+(.*)").expect("valid regex")
});

/// Picks the agent that handles a user instruction first.
#[derive(Debug, Clone)]
pub struct DelegationRouter {
    /// `(marker, agent id)` pairs in priority order.
    markers: Vec<(String, String)>,
    default_agent: String,
}

impl DelegationRouter {
    /// Router over the standard markers, defaulting to the team leader.
    pub fn new() -> Self {
        Self {
            markers: MENTION_PRIORITY
                .iter()
                .map(|id| (format!("@{id}"), (*id).to_string()))
                .collect(),
            default_agent: DEFAULT_LEADER.to_string(),
        }
    }

    /// Router whose markers are limited to agents present in `registry` and
    /// whose fallback is the registry's default agent.
    pub fn for_registry(registry: &AgentRegistry) -> Self {
        let mut router = Self::new();
        router.markers.retain(|(_, id)| registry.contains(id));
        router.default_agent = registry.default_agent_id().to_string();
        router
    }

    /// Id of the agent that receives the first turn for `text`.
    pub fn route(&self, text: &str) -> &str {
        let lowered = text.to_lowercase();
        self.markers
            .iter()
            .find(|(marker, _)| lowered.contains(marker.as_str()))
            .map(|(_, id)| id.as_str())
            .unwrap_or(&self.default_agent)
    }

    pub fn default_agent(&self) -> &str {
        &self.default_agent
    }
}

impl Default for DelegationRouter {
    fn default() -> Self {
        Self::new()
    }
}

/// Recognise a hand-over in agent output.
///
/// The explicit `DELEGATE_TO:` form wins over a bare mention. A directive with
/// an empty brief is not a hand-over (yet): with segmented responses the brief
/// may still be on its way.
pub fn parse_delegation(text: &str) -> Option<DelegationRequest> {
    [&*DELEGATE_TO, &*MENTION].into_iter().find_map(|pattern| {
        let captures = pattern.captures(text)?;
        let target = captures.get(1)?.as_str();
        let brief = captures.get(2)?.as_str().trim();
        if brief.is_empty() {
            None
        } else {
            Some(DelegationRequest::new(target, brief))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{AgentDefinition, AgentRegistryBuilder, AgentRole};

    #[test]
    fn test_route_each_marker() {
        let router = DelegationRouter::new();
        assert_eq!(router.route("@alex fix the build"), "alex");
        assert_eq!(router.route("ask @iris about crates"), "iris");
        assert_eq!(router.route("@emma write a PRD"), "emma");
        assert_eq!(router.route("please review, @sarah"), "sarah");
    }

    #[test]
    fn test_route_case_insensitive() {
        let router = DelegationRouter::new();
        assert_eq!(router.route("@ALEX do it"), "alex");
        assert_eq!(router.route("Hey @Iris"), "iris");
    }

    #[test]
    fn test_route_priority_order() {
        let router = DelegationRouter::new();
        // alex outranks sarah regardless of position in the text.
        assert_eq!(router.route("@sarah and @alex"), "alex");
        assert_eq!(router.route("@sarah @emma"), "emma");
    }

    #[test]
    fn test_route_default_leader() {
        let router = DelegationRouter::new();
        assert_eq!(router.route("add a login button"), "mike");
        assert_eq!(router.route(""), "mike");
        assert_eq!(router.route("email me at bob@example.com"), "mike");
    }

    #[test]
    fn test_route_substring_match() {
        // Plain substring matching, the same as the markers are documented.
        let router = DelegationRouter::new();
        assert_eq!(router.route("talk to @alexander"), "alex");
    }

    #[test]
    fn test_router_for_registry_drops_missing_agents() {
        let mut builder = AgentRegistryBuilder::new();
        builder.register(AgentDefinition::new("lead", "Lead", AgentRole::TeamLeader));
        builder.register(AgentDefinition::new("iris", "Iris", AgentRole::Researcher));
        let registry = builder.build();

        let router = DelegationRouter::for_registry(&registry);
        assert_eq!(router.default_agent(), "lead");
        assert_eq!(router.route("@alex @iris"), "iris");
        assert_eq!(router.route("@alex"), "lead");
    }

    #[test]
    fn test_parse_delegate_to() {
        let request = parse_delegation("DELEGATE_TO:alex\nAdd a login button to the header").unwrap();
        assert_eq!(request.target, "alex");
        assert_eq!(request.brief, "Add a login button to the header");
    }

    #[test]
    fn test_parse_delegate_to_with_preamble_and_case() {
        let text = "Sure, this needs code.\n\ndelegate_to: Alex\nAdd a button.\nUse the header.";
        let request = parse_delegation(text).unwrap();
        assert_eq!(request.target, "alex");
        assert_eq!(request.brief, "Add a button.\nUse the header.");
    }

    #[test]
    fn test_parse_mention_form() {
        let request = parse_delegation("@iris compare serde and miniserde").unwrap();
        assert_eq!(request.target, "iris");
        assert_eq!(request.brief, "compare serde and miniserde");

        let request = parse_delegation("Handing over.\n@Sarah please review the diff").unwrap();
        assert_eq!(request.target, "sarah");
    }

    #[test]
    fn test_parse_incomplete_directive() {
        assert!(parse_delegation("DELEGATE_TO:alex").is_none());
        assert!(parse_delegation("DELEGATE_TO:alex\n").is_none());
        assert!(parse_delegation("ping @alex").is_none());
    }

    #[test]
    fn test_parse_ignores_plain_text_and_emails() {
        assert!(parse_delegation("The button is done.").is_none());
        assert!(parse_delegation("write to bob@example.com today").is_none());
    }

    #[test]
    fn test_parse_unknown_target_still_parses() {
        // Registry membership is checked by the orchestrator, not the parser.
        let request = parse_delegation("DELEGATE_TO:bob\ndo things").unwrap();
        assert_eq!(request.target, "bob");
    }
}
