// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Conversation state: the per-session ledger of messages, the active agent
//! and cumulative token usage.
//!
//! The ledger holds no policy. Who may post and what triggers a turn is decided
//! by the orchestrator; this type only keeps the append-only history and knows
//! how to render it for the completion service.

use serde::{Deserialize, Serialize};

use crate::types::{ApiMessage, ConversationMessage, Role, TokenUsage};

/// Ordered message history, active agent pointer and usage counter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationState {
    messages: Vec<ConversationMessage>,
    active_agent: Option<String>,
    usage: TokenUsage,
}

impl ConversationState {
    /// Create an empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message. Messages are never reordered or removed.
    pub fn append(&mut self, message: ConversationMessage) -> &ConversationMessage {
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    /// Append `content` as a user message unless it already is the most
    /// recent entry. Returns whether a message was added.
    pub fn append_user_input(&mut self, content: &str) -> bool {
        let already_last = self
            .messages
            .last()
            .is_some_and(|last| last.is_user() && last.content == content);
        if !already_last {
            self.messages.push(ConversationMessage::user(content));
        }
        !already_last
    }

    /// Full history, oldest first.
    pub fn history(&self) -> &[ConversationMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ConversationMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Agent currently holding the floor, if any turn has run yet.
    pub fn active_agent(&self) -> Option<&str> {
        self.active_agent.as_deref()
    }

    pub fn set_active_agent(&mut self, agent: impl Into<String>) {
        self.active_agent = Some(agent.into());
    }

    /// Add a call's usage to the running total. The total never decreases.
    pub fn accumulate_usage(&mut self, usage: TokenUsage) {
        self.usage.add(usage);
    }

    pub fn usage(&self) -> TokenUsage {
        self.usage
    }

    /// Render the history for a completion call.
    ///
    /// User messages pass through as-is. Agent messages keep the assistant
    /// role but are prefixed with `"<agent>: "` so the model can tell speakers
    /// apart. System notices stay local. When the rendered history does not end
    /// on a user message, a non-empty `input` is appended as a trailing user
    /// turn.
    pub fn assemble(&self, input: &str) -> Vec<ApiMessage> {
        let mut rendered = self.render();
        let ends_on_user = rendered.last().is_some_and(|m| m.role == Role::User);
        if !ends_on_user && !input.trim().is_empty() {
            rendered.push(ApiMessage::user(input));
        }
        rendered
    }

    /// Like [`assemble`](Self::assemble), but for a hand-over: the brief is
    /// the delegate's instruction, so it always closes the history, even
    /// right after the user's own message.
    pub fn assemble_brief(&self, brief: &str) -> Vec<ApiMessage> {
        let mut rendered = self.render();
        if !brief.trim().is_empty() {
            rendered.push(ApiMessage::user(brief));
        }
        rendered
    }

    fn render(&self) -> Vec<ApiMessage> {
        self.messages
            .iter()
            .filter_map(|message| match message.role {
                Role::User => Some(ApiMessage::user(message.content.clone())),
                Role::Assistant => Some(ApiMessage::assistant(format!(
                    "{}: {}",
                    message.agent, message.content
                ))),
                Role::System => None,
            })
            .collect()
    }

    /// Serialize the whole conversation as pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
