// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Core types for the huddle orchestration engine.
//!
//! This module defines the fundamental data structures used throughout the crate:
//! conversation messages, the wire format exchanged with the remote completion
//! service, token usage, and the ephemeral tool/delegation requests the
//! orchestration loop produces while classifying a response.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Agent id used for messages typed by the human.
pub const USER_AGENT_ID: &str = "user";

/// Agent id used for notices raised by the orchestration loop itself.
pub const SYSTEM_AGENT_ID: &str = "system";

// ============================================================================
// Conversation Messages
// ============================================================================

/// Role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    /// Wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

/// A committed entry in the conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationMessage {
    /// Stable identifier, useful as a UI key.
    pub id: Uuid,
    pub role: Role,
    /// Originating agent (`user` for human input, `system` for loop notices).
    pub agent: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ConversationMessage {
    fn new(role: Role, agent: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            agent: agent.into(),
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    /// Create a message typed by the human.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, USER_AGENT_ID, content)
    }

    /// Create a message produced by an agent.
    pub fn assistant(agent: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, agent, content)
    }

    /// Create a notice raised by the orchestration loop.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, SYSTEM_AGENT_ID, content)
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}

// ============================================================================
// Wire Format
// ============================================================================

/// A segment of message content, as exchanged with the completion service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentSegment {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
    },
    /// Any segment type this crate does not understand. Ignored.
    #[serde(other)]
    Unknown,
}

impl ContentSegment {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn tool_use(id: impl Into<String>, name: impl Into<String>, input: serde_json::Value) -> Self {
        Self::ToolUse {
            id: id.into(),
            name: name.into(),
            input,
        }
    }

    pub fn tool_result(tool_use_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::ToolResult {
            tool_use_id: tool_use_id.into(),
            content: content.into(),
        }
    }
}

/// Message content - either a simple string or structured segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApiContent {
    Text(String),
    Segments(Vec<ContentSegment>),
}

/// A `{role, content}` pair in the history sent to the completion service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiMessage {
    pub role: Role,
    pub content: ApiContent,
}

impl ApiMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: ApiContent::Text(content.into()),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: ApiContent::Text(content.into()),
        }
    }

    pub fn with_segments(role: Role, segments: Vec<ContentSegment>) -> Self {
        Self {
            role,
            content: ApiContent::Segments(segments),
        }
    }

    /// Get text content if this message has simple text content.
    pub fn as_text(&self) -> Option<&str> {
        match &self.content {
            ApiContent::Text(s) => Some(s),
            ApiContent::Segments(_) => None,
        }
    }
}

/// Request body for one remote completion call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    pub agent_id: String,
    pub messages: Vec<ApiMessage>,
    pub system_prompt: String,
    pub can_use_tools: bool,
    pub max_output_tokens: u32,
}

/// Token usage information from a completion response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    #[serde(default, alias = "input_tokens")]
    pub input_tokens: u64,
    #[serde(default, alias = "output_tokens")]
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    /// Get total tokens (input + output).
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }

    /// Add another usage record into this one.
    pub fn add(&mut self, other: TokenUsage) {
        self.input_tokens = self.input_tokens.saturating_add(other.input_tokens);
        self.output_tokens = self.output_tokens.saturating_add(other.output_tokens);
    }
}

/// Structured delegation directive a backend may return instead of (or in
/// addition to) the textual `DELEGATE_TO:` form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationDirective {
    #[serde(alias = "agent")]
    pub target: String,
    pub brief: String,
}

/// Response from the completion service.
///
/// Every field defaults so that a malformed body degrades into an empty
/// response instead of a parse failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub content: Vec<ContentSegment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delegation: Option<DelegationDirective>,
}

impl CompletionResponse {
    /// Create a response with a single text segment.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentSegment::text(text)],
            ..Default::default()
        }
    }

    /// Create a response requesting one tool invocation.
    pub fn tool_use(id: impl Into<String>, name: impl Into<String>, input: serde_json::Value) -> Self {
        Self {
            content: vec![ContentSegment::tool_use(id, name, input)],
            ..Default::default()
        }
    }

    /// Attach usage information.
    pub fn with_usage(mut self, input_tokens: u64, output_tokens: u64) -> Self {
        self.usage = Some(TokenUsage::new(input_tokens, output_tokens));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty() && self.delegation.is_none()
    }
}

// ============================================================================
// Ephemeral Requests
// ============================================================================

/// A tool call requested by an agent. Consumed as soon as the tool returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocationRequest {
    /// Correlation id tying the eventual result back to this request.
    pub id: String,
    pub name: String,
    pub params: HashMap<String, serde_json::Value>,
}

impl ToolInvocationRequest {
    /// Build from a `tool_use` segment's fields. Non-object inputs become an
    /// empty parameter map.
    pub fn from_segment(id: &str, name: &str, input: &serde_json::Value) -> Self {
        let params = match input {
            serde_json::Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            _ => HashMap::new(),
        };
        Self {
            id: id.to_string(),
            name: name.to_string(),
            params,
        }
    }

    /// Parameters as a JSON object, the shape tool handlers expect.
    pub fn params_value(&self) -> serde_json::Value {
        serde_json::Value::Object(self.params.clone().into_iter().collect())
    }
}

/// A hand-over from one agent to another, parsed from the agent's output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationRequest {
    /// Target agent id, lowercased.
    pub target: String,
    pub brief: String,
}

impl DelegationRequest {
    pub fn new(target: impl Into<String>, brief: impl Into<String>) -> Self {
        Self {
            target: target.into().to_lowercase(),
            brief: brief.into(),
        }
    }
}

// ============================================================================
// Tool Definitions
// ============================================================================

/// JSON Schema for tool input parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputSchema {
    #[serde(rename = "type")]
    pub schema_type: String, // Always "object"
    pub properties: HashMap<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
}

impl InputSchema {
    pub fn new() -> Self {
        Self {
            schema_type: "object".to_string(),
            properties: HashMap::new(),
            required: None,
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, schema: serde_json::Value) -> Self {
        self.properties.insert(name.into(), schema);
        self
    }

    pub fn with_required(mut self, required: Vec<String>) -> Self {
        self.required = Some(required);
        self
    }
}

impl Default for InputSchema {
    fn default() -> Self {
        Self::new()
    }
}

/// Definition of a tool an agent can call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: InputSchema,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: InputSchema::new(),
        }
    }

    pub fn with_schema(mut self, schema: InputSchema) -> Self {
        self.input_schema = schema;
        self
    }
}
