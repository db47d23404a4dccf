// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Orchestrator types and configuration.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::agents::AgentRegistry;
use crate::approval::{ApprovalMode, PendingApproval};
use crate::providers::SharedClient;
use crate::tools::ToolRegistry;
use crate::types::{ConversationMessage, ToolInvocationRequest};

/// Statistics for one submitted instruction (or one approved continuation),
/// covering every delegated turn it triggered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnStats {
    /// Tool invocations executed.
    pub tool_calls: usize,
    /// Completion calls attempted, failed ones included.
    pub completion_calls: usize,
    /// Delegations honoured (gated ones count once started).
    pub delegations: usize,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub duration_ms: u64,
}

impl TurnStats {
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// How a call into the orchestrator ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The chain ran to completion.
    Completed,
    /// A delegation to an execution-capable agent is waiting for
    /// [`Orchestrator::approve`](super::Orchestrator::approve) or
    /// [`Orchestrator::cancel`](super::Orchestrator::cancel).
    AwaitingApproval(PendingApproval),
    /// Nothing happened (stale or repeated approval).
    Idle,
}

impl TurnOutcome {
    pub fn pending(&self) -> Option<&PendingApproval> {
        match self {
            Self::AwaitingApproval(pending) => Some(pending),
            _ => None,
        }
    }
}

/// Observer hooks. All are fire-and-forget and run on the orchestrator's task.
///
/// Uses `Arc` so a front-end can share one closure across sessions.
#[derive(Clone, Default)]
pub struct OrchestratorCallbacks {
    /// Called for every message committed to the conversation.
    pub on_message: Option<Arc<dyn Fn(&ConversationMessage) + Send + Sync>>,
    /// Called once per tool invocation, before it runs.
    pub on_step: Option<Arc<dyn Fn(&ToolInvocationRequest) + Send + Sync>>,
    /// Called when a gated delegation is parked.
    pub on_approval_required: Option<Arc<dyn Fn(&PendingApproval) + Send + Sync>>,
    /// Called when a submission or approved continuation stops running.
    pub on_turn_complete: Option<Arc<dyn Fn(&TurnStats) + Send + Sync>>,
}

impl std::fmt::Debug for OrchestratorCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrchestratorCallbacks")
            .field("on_message", &self.on_message.is_some())
            .field("on_step", &self.on_step.is_some())
            .field("on_approval_required", &self.on_approval_required.is_some())
            .field("on_turn_complete", &self.on_turn_complete.is_some())
            .finish()
    }
}

/// Loop limits and policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Tool invocations allowed per top-level turn.
    pub max_tool_calls: usize,
    /// Delegation hops allowed per submitted instruction.
    pub max_delegation_depth: usize,
    /// Deadline for each completion call.
    pub completion_timeout: Duration,
    /// Output token cap sent with every request.
    pub max_output_tokens: u32,
    pub approval_mode: ApprovalMode,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_tool_calls: 10,
            max_delegation_depth: 8,
            completion_timeout: Duration::from_secs(30),
            max_output_tokens: 4096,
            approval_mode: ApprovalMode::Interactive,
        }
    }
}

/// Options for creating an orchestrator.
pub struct OrchestratorOptions {
    /// Remote completion backend.
    pub client: SharedClient,
    /// Agent table, shared read-only across sessions.
    pub agents: Arc<AgentRegistry>,
    /// Tool table, shared read-only across sessions.
    pub tools: Arc<ToolRegistry>,
    pub config: OrchestratorConfig,
    pub callbacks: OrchestratorCallbacks,
}
