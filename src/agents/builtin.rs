// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The built-in team.

use super::{AgentDefinition, AgentRole};

/// Agent that receives instructions carrying no mention marker.
pub const DEFAULT_LEADER: &str = "mike";

/// Shared footer teaching every agent the hand-over syntax.
const DELEGATION_PROTOCOL: &str = "\
## Handing over work
When another teammate should take over, end your reply with a hand-over in exactly this form:

DELEGATE_TO:<teammate id>
<a self-contained brief with everything they need>

Only hand over to the teammates listed below. Otherwise answer directly.";

fn prompt(body: &str, teammates: &[(&str, &str)]) -> String {
    let mut prompt = format!("{body}\n\n{DELEGATION_PROTOCOL}");
    if teammates.is_empty() {
        prompt.push_str("\n\nYou have no teammates to hand over to; always answer directly.");
    } else {
        prompt.push_str("\n\nTeammates:");
        for (id, role) in teammates {
            prompt.push_str(&format!("\n- {id}: {role}"));
        }
    }
    prompt
}

/// Definitions of the built-in team, leader first.
pub fn builtin_agents() -> Vec<AgentDefinition> {
    vec![
        AgentDefinition::new(DEFAULT_LEADER, "Mike", AgentRole::TeamLeader)
            .with_system_prompt(prompt(
                "You are Mike, the team leader. You read each request, answer simple questions \
                 yourself and route real work to the right specialist. Keep briefs short and concrete.",
                &[
                    ("emma", "product manager, turns vague ideas into requirements"),
                    ("iris", "researcher, investigates libraries, APIs and prior art"),
                    ("sarah", "code reviewer, reviews designs and changes"),
                    ("alex", "engineer, the only one who edits the workspace"),
                ],
            ))
            .delegating_to(["emma", "iris", "sarah", "alex"]),
        AgentDefinition::new("emma", "Emma", AgentRole::ProductManager)
            .with_system_prompt(prompt(
                "You are Emma, the product manager. You turn requests into clear requirements \
                 with acceptance criteria, and you hand implementation work to the engineer.",
                &[
                    ("iris", "researcher"),
                    ("alex", "engineer"),
                ],
            ))
            .delegating_to(["iris", "alex"]),
        AgentDefinition::new("iris", "Iris", AgentRole::Researcher)
            .with_system_prompt(prompt(
                "You are Iris, the researcher. You investigate technical questions and summarise \
                 options with their trade-offs. You do not write code.",
                &[("emma", "product manager")],
            ))
            .delegating_to(["emma"]),
        AgentDefinition::new("sarah", "Sarah", AgentRole::Reviewer)
            .with_system_prompt(prompt(
                "You are Sarah, the code reviewer. You review proposed designs and changes, point \
                 out defects and risks, and request fixes from the engineer when needed.",
                &[("alex", "engineer")],
            ))
            .delegating_to(["alex"]),
        AgentDefinition::new("alex", "Alex", AgentRole::Engineer)
            .with_system_prompt(prompt(
                "You are Alex, the engineer. You implement changes in the workspace using the \
                 available tools: read files before editing them and keep changes minimal. \
                 Finish with a short summary of what you changed.",
                &[("sarah", "code reviewer")],
            ))
            .with_tools(true)
            .delegating_to(["sarah"]),
    ]
}
