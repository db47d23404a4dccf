// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Turn state machine and response classification.

use crate::approval::PendingApproval;
use crate::router::parse_delegation;
use crate::types::{
    CompletionRequest, CompletionResponse, ContentSegment, DelegationRequest,
    ToolInvocationRequest,
};

/// Where a submission currently is. Each step of the drive loop consumes one
/// state and produces the next; `depth` counts delegation hops from the
/// submitted instruction.
#[derive(Debug, Clone)]
pub(crate) enum TurnState {
    /// Raw user text waiting to be routed to its first agent.
    Routing { input: String },
    /// A fresh top-level turn is about to call the completion backend.
    AwaitingCompletion {
        agent: String,
        depth: usize,
        request: CompletionRequest,
    },
    /// `from` asked to hand work over.
    Delegating {
        from: String,
        depth: usize,
        request: DelegationRequest,
    },
    /// A gated hand-over needs a decision.
    AwaitingApproval(PendingApproval),
    /// The agent asked for a tool. `assistant` is its response up to and
    /// including the tool-use segment.
    ExecutingTool {
        agent: String,
        depth: usize,
        request: CompletionRequest,
        assistant: Vec<ContentSegment>,
        invocation: ToolInvocationRequest,
    },
    /// A tool result has been folded into `request`; call the same agent again.
    AwaitingContinuation {
        agent: String,
        depth: usize,
        request: CompletionRequest,
    },
    Done,
}

impl TurnState {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Routing { .. } => "routing",
            Self::AwaitingCompletion { .. } => "awaiting_completion",
            Self::Delegating { .. } => "delegating",
            Self::AwaitingApproval(_) => "awaiting_approval",
            Self::ExecutingTool { .. } => "executing_tool",
            Self::AwaitingContinuation { .. } => "awaiting_continuation",
            Self::Done => "done",
        }
    }
}

/// What an agent's response asks the loop to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// Hand over. `text` is everything the agent said up to the directive.
    Delegate {
        text: String,
        request: DelegationRequest,
    },
    /// Run a tool, then continue with the same agent.
    ToolUse {
        assistant: Vec<ContentSegment>,
        invocation: ToolInvocationRequest,
    },
    /// Final reply for this turn.
    Reply(String),
    /// Empty or unrecognised content.
    Nothing,
}

/// Walk the segments in order and decide what the response means.
///
/// Text accumulates into a buffer that is checked for a hand-over after every
/// segment; the first hand-over or tool use ends the walk. Tool segments are
/// ignored for agents without tools. A structured `delegation` field is only
/// consulted when the segments themselves asked for nothing but a reply.
pub fn classify(response: &CompletionResponse, can_use_tools: bool) -> Classification {
    let mut buffer = String::new();
    let mut seen: Vec<ContentSegment> = Vec::new();

    for segment in &response.content {
        match segment {
            ContentSegment::Text { text } => {
                buffer.push_str(text);
                seen.push(segment.clone());
                if let Some(request) = parse_delegation(&buffer) {
                    return Classification::Delegate {
                        text: buffer.trim().to_string(),
                        request,
                    };
                }
            }
            ContentSegment::ToolUse { id, name, input } if can_use_tools => {
                seen.push(segment.clone());
                return Classification::ToolUse {
                    assistant: seen,
                    invocation: ToolInvocationRequest::from_segment(id, name, input),
                };
            }
            ContentSegment::ToolUse { name, .. } => {
                tracing::debug!(tool = %name, "Ignoring tool request from agent without tools");
            }
            ContentSegment::ToolResult { .. } | ContentSegment::Unknown => {}
        }
    }

    if let Some(directive) = &response.delegation {
        if !directive.target.trim().is_empty() && !directive.brief.trim().is_empty() {
            return Classification::Delegate {
                text: buffer.trim().to_string(),
                request: DelegationRequest::new(directive.target.trim(), directive.brief.trim()),
            };
        }
    }

    let reply = buffer.trim();
    if reply.is_empty() {
        Classification::Nothing
    } else {
        Classification::Reply(reply.to_string())
    }
}
