//! LLM integration for askdb.
//!
//! Provides the client trait and implementations used to turn a question
//! into SQL text.

pub mod anthropic;
pub mod factory;
pub mod mock;
pub mod openai;
pub mod parser;
pub mod prompt;
pub mod types;

pub use anthropic::{AnthropicClient, AnthropicConfig};
pub use factory::{create_client, resolve_api_key};
pub use mock::{FailingLlmClient, MockLlmClient, SlowLlmClient};
pub use openai::{OpenAiClient, OpenAiConfig};
pub use parser::normalize_sql_response;
pub use prompt::{build_messages, build_user_prompt, SYSTEM_PROMPT};
pub use types::{Message, Role};

use async_trait::async_trait;
use std::str::FromStr;

use crate::error::Result;

/// Trait for LLM clients that can generate completions.
///
/// Implementations must be thread-safe (Send + Sync) to support async operations.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generates a completion for the given messages.
    ///
    /// Returns the complete response as a single string.
    async fn complete(&self, messages: &[Message]) -> Result<String>;

    /// Short label used in logs.
    fn name(&self) -> &str {
        "llm"
    }
}

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmProvider {
    /// OpenAI chat completions.
    #[default]
    OpenAi,
    /// Anthropic messages API.
    Anthropic,
    /// Mock client for testing (no API key required)
    Mock,
}

impl LlmProvider {
    /// Returns the provider as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Mock => "mock",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            "mock" => Ok(Self::Mock),
            _ => Err(format!("Unknown LLM provider: {}", s)),
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
