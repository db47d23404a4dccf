// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! HTTP completion client.
//!
//! Posts a [`CompletionRequest`] as JSON to `{base_url}/api/chat` and decodes
//! the [`CompletionResponse`]. Non-success statuses become
//! [`ProviderError::ApiError`] carrying the body's `detail` field verbatim when
//! there is one, else `HTTP {status}`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Instant;

#[cfg(feature = "telemetry")]
use tracing::debug;

#[cfg(feature = "telemetry")]
use crate::telemetry::metrics::GLOBAL_METRICS;

use super::CompletionClient;
use crate::error::ProviderError;
use crate::types::{CompletionRequest, CompletionResponse};

/// Backend used when nothing is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Path of the chat endpoint, relative to the base URL.
const CHAT_PATH: &str = "/api/chat";

/// Client for a chat backend speaking the huddle JSON protocol.
pub struct HttpCompletionClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpCompletionClient {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: chat_endpoint(base_url),
            api_key: api_key.filter(|key| !key.is_empty()),
        })
    }

    /// Full URL requests are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let start = Instant::now();

        #[cfg(feature = "telemetry")]
        debug!(agent = %request.agent_id, messages = request.messages.len(), "Sending completion request");

        let mut req = self
            .client
            .post(&self.endpoint)
            .header("content-type", "application/json");

        if let Some(ref api_key) = self.api_key {
            req = req.header("authorization", format!("Bearer {api_key}"));
        }

        let response = req
            .json(request)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            #[cfg(feature = "telemetry")]
            GLOBAL_METRICS.record_operation("http.complete", start.elapsed());
            return Err(error_from_body(status.as_u16(), &body));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;
        let parsed = parse_response(&body);

        #[cfg(feature = "telemetry")]
        {
            GLOBAL_METRICS.record_operation("http.complete", start.elapsed());
            debug!(
                agent = %request.agent_id,
                segments = parsed.content.len(),
                duration_ms = start.elapsed().as_millis() as u64,
                "Completion received"
            );
        }
        #[cfg(not(feature = "telemetry"))]
        let _ = start;

        Ok(parsed)
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Join the base URL and the chat path without doubling slashes.
fn chat_endpoint(base_url: &str) -> String {
    format!("{}{CHAT_PATH}", base_url.trim_end_matches('/'))
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

/// Map a non-success response to a provider error.
fn error_from_body(status_code: u16, body: &str) -> ProviderError {
    let detail = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail)
        .and_then(|detail| match detail {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s),
            serde_json::Value::Null => None,
            serde_json::Value::String(_) => None,
            other => Some(other.to_string()),
        });

    match detail {
        Some(message) => ProviderError::api(message, status_code),
        None => ProviderError::status(status_code),
    }
}

/// Decode a success body. A body that is not a completion object degrades to
/// an empty response, which the orchestrator treats as "nothing to do".
fn parse_response(body: &str) -> CompletionResponse {
    match serde_json::from_str::<CompletionResponse>(body) {
        Ok(response) => response,
        Err(_err) => {
            #[cfg(feature = "telemetry")]
            debug!(error = %_err, "Unrecognised completion body, treating as empty");
            CompletionResponse::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ContentSegment;

    #[test]
    fn test_chat_endpoint() {
        assert_eq!(chat_endpoint("http://localhost:8000"), "http://localhost:8000/api/chat");
        assert_eq!(chat_endpoint("http://localhost:8000/"), "http://localhost:8000/api/chat");
        assert_eq!(chat_endpoint("https://host/base"), "https://host/base/api/chat");
    }

    #[test]
    fn test_error_detail_verbatim() {
        let err = error_from_body(503, r#"{"detail": "Model overloaded"}"#);
        assert_eq!(err.to_string(), "Model overloaded");
        assert_eq!(err.status_code(), Some(503));
    }

    #[test]
    fn test_error_without_detail() {
        assert_eq!(error_from_body(500, "").to_string(), "HTTP 500");
        assert_eq!(error_from_body(502, "<html>bad gateway</html>").to_string(), "HTTP 502");
        assert_eq!(error_from_body(404, r#"{"detail": null}"#).to_string(), "HTTP 404");
    }

    #[test]
    fn test_error_structured_detail() {
        let err = error_from_body(422, r#"{"detail": [{"msg": "field required"}]}"#);
        assert!(err.to_string().contains("field required"));
    }

    #[test]
    fn test_parse_response_segments() {
        let body = r#"{"content": [{"type": "text", "text": "hi"}], "usage": {"input_tokens": 1, "output_tokens": 2}}"#;
        let response = parse_response(body);
        assert_eq!(response.content, vec![ContentSegment::text("hi")]);
        assert_eq!(response.usage.unwrap().total(), 3);
    }

    #[test]
    fn test_parse_response_malformed() {
        assert!(parse_response("not json").is_empty());
        assert!(parse_response(r#"{"content": "oops"}"#).is_empty());
    }

    #[test]
    fn test_empty_api_key_dropped() {
        let client = HttpCompletionClient::new(DEFAULT_BASE_URL, Some(String::new())).unwrap();
        assert!(client.api_key.is_none());
        assert_eq!(client.endpoint(), "http://localhost:8000/api/chat");
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        // Port 9 (discard) is essentially never listening on loopback.
        let client = HttpCompletionClient::new("http://127.0.0.1:9", None).unwrap();
        let request = CompletionRequest {
            agent_id: "mike".to_string(),
            messages: vec![],
            system_prompt: String::new(),
            can_use_tools: false,
            max_output_tokens: 16,
        };
        let err = client.complete(&request).await.unwrap_err();
        assert!(matches!(err, ProviderError::NetworkError(_)));
    }
}
