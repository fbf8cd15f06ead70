mod client;
pub(crate) mod types;

use std::time::Duration;

use anyhow::{anyhow, Result};

use client::OpenAiClient;
use types::{ChatRequest, WireMessage};

// =============================================================================
// OpenAi-compatible chat agent
// =============================================================================

/// Chat-completions agent for any OpenAI-compatible endpoint
/// (OpenAI itself, Gemini's compatibility layer, local servers).
#[derive(Clone)]
pub struct OpenAi {
    api_key: String,
    model: String,
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl OpenAi {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
            timeout: None,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Per-request timeout covering connect, send and body read.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn client(&self) -> Result<OpenAiClient> {
        let client = OpenAiClient::new(&self.api_key, self.timeout)?;
        Ok(match self.base_url {
            Some(ref url) => client.with_base_url(url),
            None => client,
        })
    }

    // =========================================================================
    // Completions
    // =========================================================================

    /// Chat completion constrained to a JSON object. Returns the raw message
    /// text; callers own parsing since models still wrap output in code fences.
    pub async fn json_completion(
        &self,
        system: impl Into<String>,
        user: impl Into<String>,
    ) -> Result<String> {
        let request = ChatRequest::new(&self.model)
            .message(WireMessage::system(system))
            .message(WireMessage::user(user))
            .max_tokens(4096)
            .temperature(0.2)
            .json_object();

        let response = self.client()?.chat(&request).await?;

        response
            .text()
            .ok_or_else(|| anyhow!("No response content from {}", self.model))
    }
}
