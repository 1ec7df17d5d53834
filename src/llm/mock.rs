//! Test doubles for the LLM client trait.
//!
//! Deterministic responses keyed on question patterns, plus clients that
//! always fail or never answer in time.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{AskError, Result};
use crate::llm::types::{Message, Role};
use crate::llm::LlmClient;

/// Mock LLM client that returns canned responses based on input patterns.
#[derive(Debug, Clone, Default)]
pub struct MockLlmClient {
    /// Custom response mappings (pattern -> response).
    custom_responses: Vec<(String, String)>,
    calls: Arc<AtomicUsize>,
}

impl MockLlmClient {
    /// Creates a new mock client with default responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a custom response mapping.
    ///
    /// When the question contains `pattern`, the mock will return `response`.
    pub fn with_response(
        mut self,
        pattern: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.custom_responses
            .push((pattern.into(), response.into()));
        self
    }

    /// Number of completions served so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn mock_response(&self, question: &str) -> String {
        let question = question.to_lowercase();

        for (pattern, response) in &self.custom_responses {
            if question.contains(&pattern.to_lowercase()) {
                return response.clone();
            }
        }

        if question.contains("how many") || question.contains("count") {
            return "```sql\nSELECT COUNT(*) AS total_companies FROM companies\n```".to_string();
        }

        "```sql\nSELECT \"CompanyName\", \"CompanyStatus\" FROM companies LIMIT 10\n```"
            .to_string()
    }

    /// Pulls the question back out of the user prompt.
    fn extract_question(messages: &[Message]) -> String {
        let content = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        content
            .lines()
            .find_map(|line| line.strip_prefix("User question: "))
            .unwrap_or(content)
            .to_string()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let question = Self::extract_question(messages);
        Ok(self.mock_response(&question))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Client whose every completion fails with a provider error.
#[derive(Debug, Clone)]
pub struct FailingLlmClient {
    message: String,
}

impl FailingLlmClient {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Default for FailingLlmClient {
    fn default() -> Self {
        Self::new("simulated provider outage")
    }
}

#[async_trait]
impl LlmClient for FailingLlmClient {
    async fn complete(&self, _messages: &[Message]) -> Result<String> {
        Err(AskError::llm(self.message.clone()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Client that sleeps before answering; used to exercise timeouts.
#[derive(Debug, Clone)]
pub struct SlowLlmClient {
    delay: Duration,
    response: String,
}

impl SlowLlmClient {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            response: "SELECT 1".to_string(),
        }
    }
}

#[async_trait]
impl LlmClient for SlowLlmClient {
    async fn complete(&self, _messages: &[Message]) -> Result<String> {
        tokio::time::sleep(self.delay).await;
        Ok(self.response.clone())
    }

    fn name(&self) -> &str {
        "slow"
    }
}
