// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Shared test doubles for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use huddle::agents::AgentRegistry;
use huddle::error::ProviderError;
use huddle::orchestrator::{Orchestrator, OrchestratorCallbacks, OrchestratorConfig, OrchestratorOptions};
use huddle::providers::CompletionClient;
use huddle::tools::ToolRegistry;
use huddle::types::{CompletionRequest, CompletionResponse};

/// One scripted reply: an immediate result, or a reply that takes too long.
pub enum Step {
    Reply(Result<CompletionResponse, ProviderError>),
    Stall(Duration),
}

impl From<CompletionResponse> for Step {
    fn from(response: CompletionResponse) -> Self {
        Step::Reply(Ok(response))
    }
}

impl From<ProviderError> for Step {
    fn from(err: ProviderError) -> Self {
        Step::Reply(Err(err))
    }
}

/// Completion client that replays a script and records every request.
pub struct ScriptedClient {
    script: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedClient {
    pub fn new(script: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        self.requests.lock().unwrap().push(request.clone());
        let step = self.script.lock().unwrap().pop_front();
        match step {
            Some(Step::Reply(result)) => result,
            Some(Step::Stall(duration)) => {
                tokio::time::sleep(duration).await;
                Ok(CompletionResponse::text("too late"))
            }
            None => Ok(CompletionResponse::default()),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub fn orchestrator(
    client: Arc<ScriptedClient>,
    tools: ToolRegistry,
    config: OrchestratorConfig,
    callbacks: OrchestratorCallbacks,
) -> Orchestrator {
    Orchestrator::new(OrchestratorOptions {
        client,
        agents: Arc::new(AgentRegistry::with_defaults()),
        tools: Arc::new(tools),
        config,
        callbacks,
    })
}

/// A one-shot HTTP server returning a canned response.
pub struct CannedServer {
    pub base_url: String,
    request: oneshot::Receiver<String>,
}

impl CannedServer {
    pub async fn start(status: u16, body: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();
        let body = body.to_string();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let raw = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {status} Canned\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            let _ = tx.send(raw);
        });

        CannedServer {
            base_url: format!("http://{addr}"),
            request: rx,
        }
    }

    /// The raw request the server received (head and body).
    pub async fn received(self) -> String {
        self.request.await.unwrap()
    }
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = socket.read(&mut buf).await.unwrap();
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);

        let text = String::from_utf8_lossy(&data);
        if let Some(head_end) = text.find("\r\n\r\n") {
            let content_length = text[..head_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if data.len() >= head_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&data).into_owned()
}
