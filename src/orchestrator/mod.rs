// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Orchestrator - the multi-agent turn loop.
//!
//! One orchestrator owns one session: the shared conversation, the approval
//! gate and the per-turn counters. A submission is routed to its first agent,
//! then driven through an explicit state machine ([`TurnState`]):
//!
//! ```text
//! Routing -> AwaitingCompletion -> (reply) Done
//!                               -> (tool use) ExecutingTool -> AwaitingContinuation -> ...
//!                               -> (hand-over) Delegating -> AwaitingCompletion (new agent)
//!                                                         -> AwaitingApproval (engineer)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use huddle::agents::AgentRegistry;
//! use huddle::orchestrator::{Orchestrator, OrchestratorOptions, TurnOutcome};
//! use huddle::tools::ToolRegistry;
//! use std::sync::Arc;
//!
//! let mut orchestrator = Orchestrator::new(OrchestratorOptions {
//!     client,
//!     agents: Arc::new(AgentRegistry::with_defaults()),
//!     tools: Arc::new(ToolRegistry::for_workspace(".")),
//!     config: OrchestratorConfig::default(),
//!     callbacks: OrchestratorCallbacks::default(),
//! });
//!
//! if let TurnOutcome::AwaitingApproval(pending) = orchestrator.submit("add a login button").await? {
//!     orchestrator.approve(pending.id).await;
//! }
//! ```

mod state;
mod types;

pub use state::{classify, Classification};
pub use types::{
    OrchestratorCallbacks, OrchestratorConfig, OrchestratorOptions, TurnOutcome, TurnStats,
};

pub(crate) use state::TurnState;

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::agents::AgentRegistry;
use crate::approval::{ApprovalGate, ApprovalMode, Continuation, PendingApproval};
use crate::conversation::ConversationState;
use crate::error::{OrchestratorError, ProviderError};
use crate::providers::SharedClient;
use crate::router::DelegationRouter;
use crate::telemetry::LoopEvent;
use crate::tools::ToolRegistry;
use crate::types::{
    ApiMessage, CompletionRequest, ContentSegment, ConversationMessage, DelegationRequest, Role,
    ToolInvocationRequest,
};

#[cfg(feature = "telemetry")]
use crate::telemetry::metrics::GLOBAL_METRICS;

/// Drives agents, tools and hand-overs for one conversation.
pub struct Orchestrator {
    client: SharedClient,
    agents: Arc<AgentRegistry>,
    tools: Arc<ToolRegistry>,
    router: DelegationRouter,
    config: OrchestratorConfig,
    callbacks: OrchestratorCallbacks,
    conversation: ConversationState,
    gate: ApprovalGate,
    /// Tool invocations in the current top-level turn.
    tool_calls: usize,
    /// Stats for the run in progress.
    stats: TurnStats,
    last_stats: Option<TurnStats>,
}

impl Orchestrator {
    /// Create a new orchestrator with the given options.
    pub fn new(options: OrchestratorOptions) -> Self {
        let router = DelegationRouter::for_registry(&options.agents);
        Self {
            client: options.client,
            agents: options.agents,
            tools: options.tools,
            router,
            config: options.config,
            callbacks: options.callbacks,
            conversation: ConversationState::new(),
            gate: ApprovalGate::new(),
            tool_calls: 0,
            stats: TurnStats::default(),
            last_stats: None,
        }
    }

    pub fn conversation(&self) -> &ConversationState {
        &self.conversation
    }

    pub fn pending_approval(&self) -> Option<&PendingApproval> {
        self.gate.pending()
    }

    pub fn agents(&self) -> &AgentRegistry {
        &self.agents
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn router(&self) -> &DelegationRouter {
        &self.router
    }

    /// Stats of the most recent submission or approval.
    pub fn last_turn_stats(&self) -> Option<&TurnStats> {
        self.last_stats.as_ref()
    }

    /// Submit a user instruction; the router picks the first agent.
    ///
    /// Fails only on misuse: blank input, or a hand-over still awaiting a
    /// decision. Remote failures end up in the conversation, not here.
    pub async fn submit(&mut self, text: &str) -> Result<TurnOutcome, OrchestratorError> {
        self.ensure_ready(text)?;
        info!(chars = text.len(), "Instruction submitted");
        Ok(self.run(TurnState::Routing { input: text.to_string() }).await)
    }

    /// Submit a user instruction straight to `agent`, bypassing the router.
    pub async fn submit_to(&mut self, agent: &str, text: &str) -> Result<TurnOutcome, OrchestratorError> {
        self.ensure_ready(text)?;
        let agent = agent.to_lowercase();
        if !self.agents.contains(&agent) {
            return Err(OrchestratorError::UnknownAgent(agent));
        }
        info!(agent = %agent, chars = text.len(), "Instruction submitted");
        let start = self.begin_turn(&agent, text, true, 0);
        Ok(self.run(start).await)
    }

    /// Run the parked hand-over identified by `id`.
    ///
    /// A stale or already-consumed id does nothing and returns
    /// [`TurnOutcome::Idle`].
    pub async fn approve(&mut self, id: Uuid) -> TurnOutcome {
        let Some(pending) = self.gate.take(id) else {
            debug!(%id, "No pending approval with this id");
            return TurnOutcome::Idle;
        };

        info!(%id, from = %pending.from, target_agent = %pending.target(), "Delegation approved");
        record(LoopEvent::Approved);
        let start = self.resume(pending);
        self.run(start).await
    }

    /// Discard the parked hand-over identified by `id`. Idempotent; adds no
    /// message. Returns whether anything was discarded.
    pub fn cancel(&mut self, id: Uuid) -> bool {
        let cancelled = self.gate.cancel(id);
        if cancelled {
            info!(%id, "Delegation cancelled");
            record(LoopEvent::Rejected);
        }
        cancelled
    }

    fn ensure_ready(&self, text: &str) -> Result<(), OrchestratorError> {
        if let Some(pending) = self.gate.pending() {
            return Err(OrchestratorError::ApprovalPending {
                target: pending.target().to_string(),
            });
        }
        if text.trim().is_empty() {
            return Err(OrchestratorError::EmptyInput);
        }
        Ok(())
    }

    async fn run(&mut self, start: TurnState) -> TurnOutcome {
        let started = Instant::now();
        self.stats = TurnStats::default();

        let outcome = self.drive(start).await;

        self.stats.duration_ms = started.elapsed().as_millis() as u64;

        #[cfg(feature = "telemetry")]
        GLOBAL_METRICS.record_operation("orchestrator.run", started.elapsed());

        if let Some(ref on_turn_complete) = self.callbacks.on_turn_complete {
            on_turn_complete(&self.stats);
        }
        self.last_stats = Some(self.stats.clone());
        outcome
    }

    /// The state machine. Returns when the chain is done or parked.
    async fn drive(&mut self, mut state: TurnState) -> TurnOutcome {
        loop {
            trace!(state = state.name(), "Turn step");
            state = match state {
                TurnState::Routing { input } => {
                    let agent = self.router.route(&input).to_string();
                    debug!(agent = %agent, "Routed instruction");
                    self.begin_turn(&agent, &input, true, 0)
                }
                TurnState::AwaitingCompletion { agent, depth, request }
                | TurnState::AwaitingContinuation { agent, depth, request } => {
                    self.complete(agent, depth, request).await
                }
                TurnState::Delegating { from, depth, request } => self.delegate(from, depth, request),
                TurnState::AwaitingApproval(pending) => match self.config.approval_mode {
                    ApprovalMode::Interactive => return self.park(pending),
                    ApprovalMode::AutoApprove => {
                        warn!(target_agent = %pending.target(), "Auto-approving delegation");
                        record(LoopEvent::Approved);
                        self.resume(pending)
                    }
                    ApprovalMode::AutoReject => {
                        info!(target_agent = %pending.target(), "Auto-rejecting delegation");
                        record(LoopEvent::Rejected);
                        TurnState::Done
                    }
                },
                TurnState::ExecutingTool {
                    agent,
                    depth,
                    request,
                    assistant,
                    invocation,
                } => self.execute_tool(agent, depth, request, assistant, invocation).await,
                TurnState::Done => return TurnOutcome::Completed,
            };
        }
    }

    /// Start a top-level turn for `agent`: resets the tool counter and builds
    /// the request from the shared history. Only human input is persisted;
    /// a delegation brief always rides along as the trailing user turn.
    fn begin_turn(&mut self, agent: &str, input: &str, from_user: bool, depth: usize) -> TurnState {
        let Some(definition) = self.agents.get(agent) else {
            warn!(agent = %agent, "Turn for unknown agent skipped");
            return TurnState::Done;
        };
        let system_prompt = definition.system_prompt.clone();
        let can_use_tools = definition.can_use_tools;

        if from_user && self.conversation.append_user_input(input) {
            if let (Some(on_message), Some(message)) =
                (&self.callbacks.on_message, self.conversation.last())
            {
                on_message(message);
            }
        }

        self.tool_calls = 0;
        self.conversation.set_active_agent(agent);

        let request = CompletionRequest {
            agent_id: agent.to_string(),
            messages: if from_user {
                self.conversation.assemble(input)
            } else {
                self.conversation.assemble_brief(input)
            },
            system_prompt,
            can_use_tools,
            max_output_tokens: self.config.max_output_tokens,
        };

        TurnState::AwaitingCompletion {
            agent: agent.to_string(),
            depth,
            request,
        }
    }

    async fn complete(&mut self, agent: String, depth: usize, request: CompletionRequest) -> TurnState {
        self.stats.completion_calls += 1;
        let started = Instant::now();

        let result = match tokio::time::timeout(self.config.completion_timeout, self.client.complete(&request)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(self.config.completion_timeout.as_millis() as u64)),
        };

        #[cfg(feature = "telemetry")]
        GLOBAL_METRICS.record_operation(&format!("completion.{agent}"), started.elapsed());

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                warn!(
                    agent = %agent,
                    client = self.client.name(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    error = %err,
                    "Completion failed"
                );
                record(LoopEvent::RemoteFailure);
                self.commit(ConversationMessage::assistant(&agent, format!("Error: {err}")));
                return TurnState::Done;
            }
        };

        if let Some(usage) = response.usage {
            self.conversation.accumulate_usage(usage);
            self.stats.input_tokens += usage.input_tokens;
            self.stats.output_tokens += usage.output_tokens;

            #[cfg(feature = "telemetry")]
            GLOBAL_METRICS.record_tokens(usage.input_tokens, usage.output_tokens);
        }

        match classify(&response, request.can_use_tools) {
            Classification::Delegate { text, request: delegation } => {
                debug!(agent = %agent, target_agent = %delegation.target, "Hand-over requested");
                if !text.is_empty() {
                    self.commit(ConversationMessage::assistant(&agent, text));
                }
                TurnState::Delegating {
                    from: agent,
                    depth,
                    request: delegation,
                }
            }
            Classification::ToolUse { assistant, invocation } => {
                self.tool_calls += 1;
                if self.tool_calls > self.config.max_tool_calls {
                    warn!(agent = %agent, limit = self.config.max_tool_calls, "Tool call limit reached");
                    record(LoopEvent::ToolCeiling);
                    self.commit(ConversationMessage::system(format!(
                        "Tool call limit reached ({} calls); stopping {agent}'s turn.",
                        self.config.max_tool_calls
                    )));
                    return TurnState::Done;
                }
                TurnState::ExecutingTool {
                    agent,
                    depth,
                    request,
                    assistant,
                    invocation,
                }
            }
            Classification::Reply(text) => {
                self.commit(ConversationMessage::assistant(&agent, text));
                TurnState::Done
            }
            Classification::Nothing => {
                debug!(agent = %agent, "Empty response, nothing to do");
                TurnState::Done
            }
        }
    }

    async fn execute_tool(
        &mut self,
        agent: String,
        depth: usize,
        mut request: CompletionRequest,
        assistant: Vec<ContentSegment>,
        invocation: ToolInvocationRequest,
    ) -> TurnState {
        if let Some(ref on_step) = self.callbacks.on_step {
            on_step(&invocation);
        }
        self.stats.tool_calls += 1;

        let result = self.tools.invoke(&invocation.name, invocation.params_value()).await;
        debug!(
            agent = %agent,
            tool = %result.tool_name,
            is_error = result.is_error,
            call = self.tool_calls,
            "Tool result folded into continuation"
        );

        request.messages.push(ApiMessage::with_segments(Role::Assistant, assistant));
        request.messages.push(ApiMessage::with_segments(
            Role::User,
            vec![ContentSegment::tool_result(&invocation.id, result.output.into_content())],
        ));

        TurnState::AwaitingContinuation { agent, depth, request }
    }

    fn delegate(&mut self, from: String, depth: usize, request: DelegationRequest) -> TurnState {
        if !self.agents.allows_delegation(&from, &request.target) {
            debug!(from = %from, target_agent = %request.target, "Delegation target not allowed, ignoring");
            return TurnState::Done;
        }

        let depth = depth + 1;
        if depth > self.config.max_delegation_depth {
            warn!(from = %from, target_agent = %request.target, limit = self.config.max_delegation_depth, "Delegation limit reached");
            record(LoopEvent::DelegationCeiling);
            self.commit(ConversationMessage::system(format!(
                "Delegation limit reached ({} hand-overs); {} was not started.",
                self.config.max_delegation_depth, request.target
            )));
            return TurnState::Done;
        }

        let continuation = Continuation {
            agent: request.target,
            input: request.brief,
            depth,
        };

        if self.agents.is_execution_capable(&continuation.agent) {
            info!(from = %from, target_agent = %continuation.agent, "Delegation requires approval");
            record(LoopEvent::GatedDelegation);
            return TurnState::AwaitingApproval(PendingApproval::new(from, continuation));
        }

        info!(from = %from, target_agent = %continuation.agent, depth, "Delegating");
        self.start_continuation(continuation)
    }

    fn resume(&mut self, pending: PendingApproval) -> TurnState {
        self.start_continuation(pending.continuation)
    }

    fn start_continuation(&mut self, continuation: Continuation) -> TurnState {
        record(LoopEvent::Delegation);
        self.stats.delegations += 1;
        self.begin_turn(&continuation.agent, &continuation.input, false, continuation.depth)
    }

    fn park(&mut self, pending: PendingApproval) -> TurnOutcome {
        if let Err(err) = self.gate.park(pending.clone()) {
            warn!(error = %err, "Could not park delegation");
            return TurnOutcome::Completed;
        }
        if let Some(ref on_approval_required) = self.callbacks.on_approval_required {
            on_approval_required(&pending);
        }
        TurnOutcome::AwaitingApproval(pending)
    }

    fn commit(&mut self, message: ConversationMessage) {
        let committed = self.conversation.append(message);
        if let Some(ref on_message) = self.callbacks.on_message {
            on_message(committed);
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("client", &self.client.name())
            .field("agents", &self.agents.ids())
            .field("config", &self.config)
            .field("messages", &self.conversation.len())
            .field("pending_approval", &self.gate.is_pending())
            .finish()
    }
}

fn record(event: LoopEvent) {
    #[cfg(feature = "telemetry")]
    GLOBAL_METRICS.record_event(event);

    #[cfg(not(feature = "telemetry"))]
    let _ = event;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::CompletionClient;
    use crate::types::CompletionResponse;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Client that replays a fixed script and records every request.
    struct ScriptedClient {
        script: Mutex<VecDeque<Result<CompletionResponse, ProviderError>>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedClient {
        fn new(script: Vec<Result<CompletionResponse, ProviderError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<CompletionRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, ProviderError> {
            self.requests.lock().unwrap().push(request.clone());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(CompletionResponse::default()))
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    /// Client that never answers in time.
    struct SlowClient;

    #[async_trait]
    impl CompletionClient for SlowClient {
        async fn complete(&self, _request: &CompletionRequest) -> Result<CompletionResponse, ProviderError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(CompletionResponse::text("too late"))
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    fn orchestrator(client: SharedClient, config: OrchestratorConfig) -> Orchestrator {
        orchestrator_with(client, config, OrchestratorCallbacks::default())
    }

    fn orchestrator_with(
        client: SharedClient,
        config: OrchestratorConfig,
        callbacks: OrchestratorCallbacks,
    ) -> Orchestrator {
        Orchestrator::new(OrchestratorOptions {
            client,
            agents: Arc::new(AgentRegistry::with_defaults()),
            tools: Arc::new(ToolRegistry::new()),
            config,
            callbacks,
        })
    }

    #[tokio::test]
    async fn test_reply_from_leader() {
        let client = ScriptedClient::new(vec![Ok(CompletionResponse::text("Hello there.").with_usage(10, 5))]);
        let mut orch = orchestrator(client.clone(), OrchestratorConfig::default());

        let outcome = orch.submit("hi team").await.unwrap();
        assert_eq!(outcome, TurnOutcome::Completed);

        let history = orch.conversation().history();
        assert_eq!(history.len(), 2);
        assert!(history[0].is_user());
        assert_eq!(history[1].agent, "mike");
        assert_eq!(history[1].content, "Hello there.");
        assert_eq!(orch.conversation().usage().total(), 15);

        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].agent_id, "mike");
        assert!(!requests[0].can_use_tools);
        assert_eq!(requests[0].max_output_tokens, 4096);
    }

    #[tokio::test]
    async fn test_mention_routes_to_agent() {
        let client = ScriptedClient::new(vec![Ok(CompletionResponse::text("Found three crates."))]);
        let mut orch = orchestrator(client.clone(), OrchestratorConfig::default());

        orch.submit("@iris which http crates exist?").await.unwrap();
        assert_eq!(client.requests()[0].agent_id, "iris");
        assert_eq!(orch.conversation().active_agent(), Some("iris"));
    }

    #[tokio::test]
    async fn test_remote_failure_commits_error_message() {
        let client = ScriptedClient::new(vec![Err(ProviderError::api("Model overloaded", 503))]);
        let mut orch = orchestrator(client, OrchestratorConfig::default());

        orch.submit("hi").await.unwrap();
        let last = orch.conversation().last().unwrap();
        assert_eq!(last.agent, "mike");
        assert_eq!(last.content, "Error: Model overloaded");
        assert_eq!(orch.conversation().usage().total(), 0);
    }

    #[tokio::test]
    async fn test_timeout_commits_single_error() {
        let config = OrchestratorConfig {
            completion_timeout: Duration::from_millis(20),
            ..Default::default()
        };
        let mut orch = orchestrator(Arc::new(SlowClient), config);

        orch.submit("hi").await.unwrap();
        let history = orch.conversation().history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].content, "Error: Request timed out after 20ms");
    }

    #[tokio::test]
    async fn test_non_gated_delegation_runs_immediately() {
        let client = ScriptedClient::new(vec![
            Ok(CompletionResponse::text("DELEGATE_TO:emma\nWrite a PRD for dark mode")),
            Ok(CompletionResponse::text("PRD: dark mode toggle in settings.")),
        ]);
        let mut orch = orchestrator(client.clone(), OrchestratorConfig::default());

        let outcome = orch.submit("we need dark mode").await.unwrap();
        assert_eq!(outcome, TurnOutcome::Completed);

        let agents: Vec<&str> = orch.conversation().history().iter().map(|m| m.agent.as_str()).collect();
        assert_eq!(agents, vec!["user", "mike", "emma"]);

        let requests = client.requests();
        assert_eq!(requests[1].agent_id, "emma");
        let trailing = requests[1].messages.last().unwrap();
        assert_eq!(trailing.role, Role::User);
        assert_eq!(trailing.as_text(), Some("Write a PRD for dark mode"));
        assert_eq!(orch.last_turn_stats().unwrap().delegations, 1);
    }

    #[tokio::test]
    async fn test_disallowed_delegation_is_noop() {
        // iris may not hand over to sarah.
        let client = ScriptedClient::new(vec![Ok(CompletionResponse::text(
            "DELEGATE_TO:sarah\nReview this",
        ))]);
        let mut orch = orchestrator(client.clone(), OrchestratorConfig::default());

        orch.submit_to("iris", "look into it").await.unwrap();
        assert_eq!(client.requests().len(), 1);
        assert_eq!(orch.conversation().len(), 2);
    }

    #[tokio::test]
    async fn test_gated_delegation_waits_for_approval() {
        let client = ScriptedClient::new(vec![
            Ok(CompletionResponse::text("DELEGATE_TO:alex\nAdd a login button to the header")),
            Ok(CompletionResponse::text("Added the button.")),
        ]);
        let approvals = Arc::new(AtomicUsize::new(0));
        let seen = approvals.clone();
        let callbacks = OrchestratorCallbacks {
            on_approval_required: Some(Arc::new(move |_: &PendingApproval| {
                seen.fetch_add(1, Ordering::SeqCst);
            })),
            ..Default::default()
        };
        let mut orch = orchestrator_with(client.clone(), OrchestratorConfig::default(), callbacks);

        let outcome = orch.submit("add a login button").await.unwrap();
        let pending = outcome.pending().cloned().unwrap();
        assert_eq!(pending.target(), "alex");
        assert_eq!(pending.brief(), "Add a login button to the header");
        assert_eq!(approvals.load(Ordering::SeqCst), 1);
        assert!(orch.conversation().history().iter().all(|m| m.agent != "alex"));
        assert_eq!(client.requests().len(), 1);

        let err = orch.submit("anything else?").await.unwrap_err();
        assert_eq!(err, OrchestratorError::ApprovalPending { target: "alex".to_string() });

        assert_eq!(orch.approve(pending.id).await, TurnOutcome::Completed);
        assert_eq!(orch.conversation().last().unwrap().agent, "alex");
        assert!(client.requests()[1].can_use_tools);

        // Second approval is a no-op.
        assert_eq!(orch.approve(pending.id).await, TurnOutcome::Idle);
        assert_eq!(client.requests().len(), 2);
        assert!(orch.pending_approval().is_none());
    }

    #[tokio::test]
    async fn test_cancel_discards_without_message() {
        let client = ScriptedClient::new(vec![Ok(CompletionResponse::text(
            "DELEGATE_TO:alex\nDelete the cache dir",
        ))]);
        let mut orch = orchestrator(client.clone(), OrchestratorConfig::default());

        let pending = orch.submit("clean up").await.unwrap().pending().cloned().unwrap();
        let before = orch.conversation().len();

        assert!(orch.cancel(pending.id));
        assert!(!orch.cancel(pending.id));
        assert_eq!(orch.conversation().len(), before);
        assert_eq!(orch.approve(pending.id).await, TurnOutcome::Idle);
        assert_eq!(client.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_auto_modes() {
        let script = || {
            vec![
                Ok(CompletionResponse::text("DELEGATE_TO:alex\nBump the version")),
                Ok(CompletionResponse::text("Bumped.")),
            ]
        };

        let client = ScriptedClient::new(script());
        let config = OrchestratorConfig {
            approval_mode: ApprovalMode::AutoApprove,
            ..Default::default()
        };
        let mut orch = orchestrator(client.clone(), config);
        assert_eq!(orch.submit("release").await.unwrap(), TurnOutcome::Completed);
        assert_eq!(orch.conversation().last().unwrap().agent, "alex");

        let client = ScriptedClient::new(script());
        let config = OrchestratorConfig {
            approval_mode: ApprovalMode::AutoReject,
            ..Default::default()
        };
        let mut orch = orchestrator(client.clone(), config);
        assert_eq!(orch.submit("release").await.unwrap(), TurnOutcome::Completed);
        assert_eq!(client.requests().len(), 1);
        assert!(orch.pending_approval().is_none());
    }

    #[tokio::test]
    async fn test_missing_tool_yields_structured_error() {
        let client = ScriptedClient::new(vec![
            Ok(CompletionResponse::tool_use("call-1", "deploy", json!({"env": "prod"}))),
            Ok(CompletionResponse::text("No deploy tool available.")),
        ]);
        let mut orch = orchestrator(client.clone(), OrchestratorConfig::default());

        orch.submit_to("alex", "deploy it").await.unwrap();

        let requests = client.requests();
        assert_eq!(requests.len(), 2);
        let messages = &requests[1].messages;
        assert_eq!(messages.len(), requests[0].messages.len() + 2);
        let expected = ApiMessage::with_segments(
            Role::User,
            vec![ContentSegment::tool_result("call-1", r#"{"error":"Tool not found"}"#)],
        );
        assert_eq!(messages.last().unwrap(), &expected);
        assert_eq!(orch.conversation().last().unwrap().content, "No deploy tool available.");
    }

    #[tokio::test]
    async fn test_tool_ceiling() {
        let mut script: Vec<Result<CompletionResponse, ProviderError>> = (0..11)
            .map(|i| Ok(CompletionResponse::tool_use(format!("c{i}"), "list_directory", json!({}))))
            .collect();
        script.push(Ok(CompletionResponse::text("never reached")));
        let client = ScriptedClient::new(script);
        let config = OrchestratorConfig::default();
        let mut orch = orchestrator(client.clone(), config);

        orch.submit_to("alex", "explore").await.unwrap();

        assert_eq!(client.requests().len(), 11);
        let last = orch.conversation().last().unwrap();
        assert_eq!(last.role, Role::System);
        assert!(last.content.contains("Tool call limit reached (10 calls)"));
        assert_eq!(orch.last_turn_stats().unwrap().tool_calls, 10);
    }

    #[tokio::test]
    async fn test_delegation_ceiling() {
        // mike -> emma is hop 1, emma -> iris would be hop 2.
        let client = ScriptedClient::new(vec![
            Ok(CompletionResponse::text("DELEGATE_TO:emma\nScope it")),
            Ok(CompletionResponse::text("DELEGATE_TO:iris\nResearch it")),
        ]);
        let config = OrchestratorConfig {
            max_delegation_depth: 1,
            ..Default::default()
        };
        let mut orch = orchestrator(client.clone(), config);

        orch.submit("new feature").await.unwrap();
        assert_eq!(client.requests().len(), 2);
        let last = orch.conversation().last().unwrap();
        assert_eq!(last.role, Role::System);
        assert!(last.content.contains("iris was not started"));
    }

    #[tokio::test]
    async fn test_empty_response_is_noop() {
        let client = ScriptedClient::new(vec![Ok(CompletionResponse::default())]);
        let mut orch = orchestrator(client, OrchestratorConfig::default());
        orch.submit("hello?").await.unwrap();
        assert_eq!(orch.conversation().len(), 1);
    }

    #[tokio::test]
    async fn test_input_validation() {
        let client = ScriptedClient::new(vec![]);
        let mut orch = orchestrator(client, OrchestratorConfig::default());
        assert_eq!(orch.submit("   ").await.unwrap_err(), OrchestratorError::EmptyInput);
        assert_eq!(
            orch.submit_to("bob", "hi").await.unwrap_err(),
            OrchestratorError::UnknownAgent("bob".to_string())
        );
    }

    #[tokio::test]
    async fn test_on_message_sees_every_commit() {
        let client = ScriptedClient::new(vec![
            Ok(CompletionResponse::text("DELEGATE_TO:iris\nFind a crate")),
            Ok(CompletionResponse::text("Use reqwest.")),
        ]);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let callbacks = OrchestratorCallbacks {
            on_message: Some(Arc::new(move |m: &ConversationMessage| {
                sink.lock().unwrap().push(m.agent.clone());
            })),
            ..Default::default()
        };
        let mut orch = orchestrator_with(client, OrchestratorConfig::default(), callbacks);

        orch.submit("which http crate?").await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec!["user", "mike", "iris"]);
    }
}
