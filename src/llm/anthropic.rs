//! Anthropic LLM client implementation.
//!
//! Implements the LlmClient trait for Anthropic's messages API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{AskError, Result};
use crate::llm::types::{Message, Role};
use crate::llm::LlmClient;

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Default model.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Anthropic API base URL.
const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";

/// Anthropic API version header.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Maximum number of attempts for transient errors.
const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Base delay for exponential backoff (milliseconds).
const RETRY_BASE_DELAY_MS: u64 = 500;

/// Anthropic client configuration.
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// API key for authentication.
    pub api_key: String,
    /// Model to use.
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Endpoint, overridable for proxies.
    pub api_url: String,
}

impl AnthropicConfig {
    /// Creates a new config with the given API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_tokens: 200,
            temperature: 0.1,
            api_url: ANTHROPIC_API_URL.to_string(),
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

/// Anthropic LLM client.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    config: AnthropicConfig,
    client: Client,
}

impl AnthropicClient {
    /// Creates a new Anthropic client with the given configuration.
    pub fn new(config: AnthropicConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AskError::llm(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Extracts the system message and converts remaining messages to Anthropic format.
    fn convert_messages(messages: &[Message]) -> (Option<String>, Vec<AnthropicMessage>) {
        let mut system = None;
        let mut converted = Vec::new();

        for msg in messages {
            match msg.role {
                // Anthropic takes the system prompt as a top-level field
                Role::System => system = Some(msg.content.clone()),
                Role::User | Role::Assistant => converted.push(AnthropicMessage {
                    role: msg.role.as_str().to_string(),
                    content: msg.content.clone(),
                }),
            }
        }

        (system, converted)
    }

    /// Parses an API error response and returns (error, is_retryable).
    ///
    /// Overloaded (529) counts as a server error and is retried.
    fn parse_error(status: reqwest::StatusCode, body: &str) -> (AskError, bool) {
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return (
                AskError::llm("Authentication failed. Check your ANTHROPIC_API_KEY."),
                false,
            );
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return (AskError::llm("Rate limited by Anthropic."), true);
        }

        let is_retryable = status.is_server_error();

        if let Ok(error_response) = serde_json::from_str::<AnthropicErrorResponse>(body) {
            return (
                AskError::llm(format!(
                    "Anthropic API error: {}",
                    error_response.error.message
                )),
                is_retryable,
            );
        }

        (
            AskError::llm(format!("Anthropic API error ({}): {}", status, body)),
            is_retryable,
        )
    }

    /// Joins the text blocks of a successful response.
    fn parse_completion(body: &str) -> Result<String> {
        let response: AnthropicResponse = serde_json::from_str(body)
            .map_err(|e| AskError::llm(format!("Failed to parse response: {}", e)))?;

        let text = response
            .content
            .into_iter()
            .filter(|block| block.content_type == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        if text.is_empty() {
            return Err(AskError::llm("No response from Anthropic"));
        }

        Ok(text)
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let (system, converted_messages) = Self::convert_messages(messages);

        let request = AnthropicRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            system,
            messages: converted_messages,
        };

        let mut last_error = None;
        let mut delay = Duration::from_millis(RETRY_BASE_DELAY_MS);

        for attempt in 1..=MAX_RETRY_ATTEMPTS {
            debug!(
                "Anthropic API request attempt {} of {}",
                attempt, MAX_RETRY_ATTEMPTS
            );

            let result = self
                .client
                .post(&self.config.api_url)
                .header("x-api-key", &self.config.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
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
                    warn!("Anthropic API request failed (attempt {}): {}", attempt, status);
                    last_error = Some(error);
                    is_retryable
                }
                Err(e) => {
                    let error = if e.is_timeout() {
                        AskError::llm("Request to Anthropic timed out")
                    } else if e.is_connect() {
                        AskError::llm("Failed to connect to Anthropic API")
                    } else {
                        AskError::llm(format!("Request failed: {}", e))
                    };
                    warn!("Anthropic API request failed (attempt {}): {}", attempt, e);
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

        Err(last_error.unwrap_or_else(|| AskError::llm("Anthropic request was not attempted")))
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

// Anthropic API types

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorResponse {
    error: AnthropicError,
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    message: String,
}
