// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Remote completion clients.
//!
//! The orchestrator only depends on the [`CompletionClient`] trait. The
//! production implementation is [`HttpCompletionClient`], which posts the
//! conversation to a chat backend over HTTP. Tests substitute scripted
//! clients.
//!
//! # Example
//!
//! ```rust,ignore
//! use huddle::providers::{CompletionClient, HttpCompletionClient};
//!
//! let client = HttpCompletionClient::new("http://localhost:8000", None)?;
//! let response = client.complete(&request).await?;
//! ```

pub mod http;

pub use http::{HttpCompletionClient, DEFAULT_BASE_URL};

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::ResolvedConfig;
use crate::error::ProviderError;
use crate::types::{CompletionRequest, CompletionResponse};

/// A backend that turns one agent's view of the conversation into a response.
///
/// Implementations must not retry and must not enforce the per-call deadline
/// themselves; the orchestrator wraps every call in its own timeout.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Perform one completion call.
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, ProviderError>;

    /// Short name used in logs.
    fn name(&self) -> &str;
}

/// Shared, type-erased completion client.
pub type SharedClient = Arc<dyn CompletionClient>;

/// Build the HTTP client described by a resolved configuration.
pub fn create_client_from_config(config: &ResolvedConfig) -> Result<SharedClient, ProviderError> {
    let api_key = config
        .api_key
        .clone()
        .or_else(|| std::env::var("HUDDLE_API_KEY").ok());
    let client = HttpCompletionClient::new(&config.base_url, api_key)?;
    Ok(Arc::new(client))
}
