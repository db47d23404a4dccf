// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Approval gate for delegations to execution-capable agents.
//!
//! A gated delegation is parked as a [`PendingApproval`] carrying the
//! [`Continuation`] to run once a human confirms it. At most one record is
//! outstanding at a time; while it is, the orchestration loop is suspended.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::OrchestratorError;

/// How gated delegations are resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ApprovalMode {
    /// Suspend and wait for `approve` or `cancel`.
    #[default]
    Interactive,
    /// Run the continuation immediately.
    AutoApprove,
    /// Discard every gated delegation.
    AutoReject,
}

impl std::str::FromStr for ApprovalMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "interactive" => Ok(Self::Interactive),
            "autoapprove" => Ok(Self::AutoApprove),
            "autoreject" => Ok(Self::AutoReject),
            other => Err(format!(
                "unknown approval mode '{other}' (expected interactive, autoApprove or autoReject)"
            )),
        }
    }
}

/// What happens once a pending delegation is approved: a new top-level turn
/// for `agent` with `input` as its brief.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Continuation {
    pub agent: String,
    pub input: String,
    /// Delegation depth the resumed turn runs at.
    pub depth: usize,
}

/// A gated delegation awaiting human confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingApproval {
    pub id: Uuid,
    /// Agent that requested the hand-over.
    pub from: String,
    pub requested_at: DateTime<Utc>,
    pub continuation: Continuation,
}

impl PendingApproval {
    pub fn new(from: impl Into<String>, continuation: Continuation) -> Self {
        Self {
            id: Uuid::new_v4(),
            from: from.into(),
            requested_at: Utc::now(),
            continuation,
        }
    }

    /// Agent the work is handed to.
    pub fn target(&self) -> &str {
        &self.continuation.agent
    }

    /// Brief shown to the human.
    pub fn brief(&self) -> &str {
        &self.continuation.input
    }
}

/// Holds the single outstanding approval, if any.
#[derive(Debug, Default)]
pub struct ApprovalGate {
    pending: Option<PendingApproval>,
}

impl ApprovalGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park a gated delegation. Fails if another one is already outstanding.
    pub fn park(&mut self, approval: PendingApproval) -> Result<(), OrchestratorError> {
        if let Some(existing) = &self.pending {
            return Err(OrchestratorError::ApprovalPending {
                target: existing.target().to_string(),
            });
        }
        self.pending = Some(approval);
        Ok(())
    }

    pub fn pending(&self) -> Option<&PendingApproval> {
        self.pending.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Remove and return the record if `id` names it. Any other id leaves the
    /// gate untouched.
    pub fn take(&mut self, id: Uuid) -> Option<PendingApproval> {
        if self.pending.as_ref().is_some_and(|p| p.id == id) {
            self.pending.take()
        } else {
            None
        }
    }

    /// Discard the record if `id` names it. Idempotent.
    pub fn cancel(&mut self, id: Uuid) -> bool {
        self.take(id).is_some()
    }
}
