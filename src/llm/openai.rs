//! OpenAI LLM client implementation.
//!
//! Implements the LlmClient trait for OpenAI's chat completions API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{AskError, Result};
use crate::llm::types::Message;
use crate::llm::LlmClient;

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Default chat model.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// OpenAI API base URL.
const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Maximum number of retry attempts for transient errors.
const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Base delay for exponential backoff (milliseconds).
const RETRY_BASE_DELAY_MS: u64 = 500;

/// OpenAI client configuration.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API key for authentication.
    pub api_key: String,
    /// Model to use (e.g., "gpt-3.5-turbo", "gpt-4o").
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Sampling temperature. Kept low so output stays close to deterministic.
    pub temperature: f32,
    /// Endpoint, overridable for proxies.
    pub api_url: String,
}

impl OpenAiConfig {
    /// Creates a new config with the given API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_tokens: 200,
            temperature: 0.1,
            api_url: OPENAI_API_URL.to_string(),
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Sets generation limits.
    pub fn with_sampling(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    /// Sets the endpoint URL.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}

/// OpenAI LLM client.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiClient {
    /// Creates a new OpenAI client with the given configuration.
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AskError::llm(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Returns the configured model name.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn build_request(&self, messages: &[Message]) -> OpenAiRequest {
        OpenAiRequest {
            model: self.config.model.clone(),
            messages: Self::convert_messages(messages),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        }
    }

    /// Converts internal messages to OpenAI API format.
    fn convert_messages(messages: &[Message]) -> Vec<OpenAiMessage> {
        messages
            .iter()
            .map(|m| OpenAiMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
            })
            .collect()
    }

    /// Parses an API error response and returns (error, is_retryable).
    fn parse_error(status: reqwest::StatusCode, body: &str) -> (AskError, bool) {
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return (
                AskError::llm("Authentication failed. Check your OPENAI_API_KEY."),
                false,
            );
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return (AskError::llm("Rate limited by OpenAI."), true);
        }

        let is_retryable = status.is_server_error();

        if let Ok(error_response) = serde_json::from_str::<OpenAiErrorResponse>(body) {
            return (
                AskError::llm(format!(
                    "OpenAI API error: {}",
                    error_response.error.message
                )),
                is_retryable,
            );
        }

        (
            AskError::llm(format!("OpenAI API error ({}): {}", status, body)),
            is_retryable,
        )
    }

    /// Pulls the first choice's text out of a successful response body.
    fn parse_completion(body: &str) -> Result<String> {
        let response: OpenAiResponse = serde_json::from_str(body)
            .map_err(|e| AskError::llm(format!("Failed to parse response: {}", e)))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AskError::llm("No response from OpenAI"))
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let request = self.build_request(messages);

        let mut last_error = None;
        let mut delay = Duration::from_millis(RETRY_BASE_DELAY_MS);

        for attempt in 1..=MAX_RETRY_ATTEMPTS {
            debug!(
                "OpenAI API request attempt {} of {}",
                attempt, MAX_RETRY_ATTEMPTS
            );

            let result = self
                .client
                .post(&self.config.api_url)
                .bearer_auth(&self.config.api_key)
                .json(&request)
                .send()
                .await;

            let is_retryable = match result {
                Ok(response) => {
                    let status = response.status();
                    let body = response
                        .text()
                        .await
                        .map_err(|e| AskError::llm(format!("Failed to read response: {}", e)))?;

                    if status.is_success() {
                        return Self::parse_completion(&body);
                    }

                    let (error, is_retryable) = Self::parse_error(status, &body);
                    warn!("OpenAI API request failed (attempt {}): {}", attempt, status);
                    last_error = Some(error);
                    is_retryable
                }
                Err(e) => {
                    let error = if e.is_timeout() {
                        AskError::llm("Request to OpenAI timed out")
                    } else if e.is_connect() {
                        AskError::llm("Failed to connect to OpenAI API")
                    } else {
                        AskError::llm(format!("Request failed: {}", e))
                    };
                    warn!("OpenAI API request failed (attempt {}): {}", attempt, e);
                    last_error = Some(error);
                    e.is_timeout() || e.is_connect()
                }
            };

            if !is_retryable || attempt >= MAX_RETRY_ATTEMPTS {
                break;
            }

            tokio::time::sleep(delay).await;
            delay *= 2;
        }

        Err(last_error.unwrap_or_else(|| AskError::llm("OpenAI request was not attempted")))
    }

    fn name(&self) -> &str {
        "openai"
    }
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiError,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    message: String,
}
