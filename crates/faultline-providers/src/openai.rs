// faultline-providers/src/openai.rs
// ============================================================================
// Module: OpenAI-Compatible Model Client
// Description: Chat-completions client over HTTP with usage extraction.
// Purpose: Implement the ModelClient seam against hosted providers.
// Dependencies: faultline-core, reqwest, serde
// ============================================================================

//! ## Overview
//! The client posts a two-message chat completion (system + user) to an
//! OpenAI-compatible endpoint with bearer auth and a bounded completion
//! budget, then extracts the first choice's content and the token usage.
//! Transport failures map onto the model-error taxonomy the gateway
//! translates to 502/504; a missing or empty choice is an invalid response.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use faultline_core::interfaces::ModelClient;
use faultline_core::interfaces::ModelError;
use faultline_core::interfaces::ModelRequest;
use faultline_core::interfaces::ModelResponse;
use faultline_core::interfaces::ModelUsage;
use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Client
// ============================================================================

/// Configuration for the hosted model client.
#[derive(Debug, Clone)]
pub struct OpenAiCompatConfig {
    /// Chat-completions endpoint URL.
    pub endpoint: String,
    /// Bearer API key.
    pub api_key: String,
    /// Model identifier requested from the provider.
    pub model: String,
    /// Request timeout.
    pub timeout: Duration,
}

/// OpenAI-compatible chat-completions client.
pub struct OpenAiCompatClient {
    /// Client configuration.
    config: OpenAiCompatConfig,
    /// Shared HTTP client.
    http: reqwest::Client,
}

impl OpenAiCompatClient {
    /// Builds a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Unreachable`] when the HTTP client cannot be
    /// constructed.
    pub fn new(config: OpenAiCompatConfig) -> Result<Self, ModelError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| ModelError::Unreachable(err.to_string()))?;
        Ok(Self { config, http })
    }
}

#[async_trait]
impl ModelClient for OpenAiCompatClient {
    fn is_mock(&self) -> bool {
        false
    }

    async fn complete(&self, request: &ModelRequest) -> Result<ModelResponse, ModelError> {
        let body = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage { role: "system".to_string(), content: request.system.clone() },
                ChatMessage { role: "user".to_string(), content: request.prompt.clone() },
            ],
            max_completion_tokens: request.max_completion_tokens,
        };
        let response = self
            .http
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;
        if !response.status().is_success() {
            let status = response.status();
            return Err(ModelError::InvalidResponse(format!("provider returned {status}")));
        }
        let completion: ChatResponse =
            response.json().await.map_err(|err| ModelError::InvalidResponse(err.to_string()))?;
        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::InvalidResponse("no choices in response".to_string()))?;
        let content = choice.message.content;
        if content.trim().is_empty() {
            return Err(ModelError::InvalidResponse("empty response content".to_string()));
        }
        let usage = completion.usage.unwrap_or_default();
        Ok(ModelResponse {
            content,
            usage: ModelUsage {
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
            },
            model: completion.model.unwrap_or_else(|| self.config.model.clone()),
        })
    }
}

/// Maps reqwest transport failures onto the model-error taxonomy.
fn map_transport_error(err: reqwest::Error) -> ModelError {
    if err.is_timeout() {
        ModelError::Timeout(err.to_string())
    } else {
        ModelError::Unreachable(err.to_string())
    }
}

// ============================================================================
// SECTION: Wire Shapes
// ============================================================================

/// Chat-completions request body.
#[derive(Debug, Serialize)]
struct ChatRequest {
    /// Model identifier.
    model: String,
    /// Conversation messages.
    messages: Vec<ChatMessage>,
    /// Completion token ceiling.
    max_completion_tokens: u32,
}

/// Single chat message.
#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    /// Message role.
    role: String,
    /// Message content.
    #[serde(default)]
    content: String,
}

/// Chat-completions response body.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    /// Returned choices.
    #[serde(default)]
    choices: Vec<ChatChoice>,
    /// Token usage block.
    #[serde(default)]
    usage: Option<ChatUsage>,
    /// Model that served the call.
    #[serde(default)]
    model: Option<String>,
}

/// Single response choice.
#[derive(Debug, Deserialize)]
struct ChatChoice {
    /// Choice message.
    message: ChatMessage,
}

/// Token usage block.
#[derive(Debug, Default, Deserialize)]
struct ChatUsage {
    /// Prompt tokens consumed.
    #[serde(default)]
    prompt_tokens: u64,
    /// Completion tokens produced.
    #[serde(default)]
    completion_tokens: u64,
}
