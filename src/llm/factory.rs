//! LLM client factory.
//!
//! Centralizes provider-specific logic for creating LLM clients.

use crate::config::LlmConfig;
use crate::error::{AskError, Result};
use crate::llm::{
    anthropic, openai, AnthropicClient, AnthropicConfig, LlmClient, LlmProvider, MockLlmClient,
    OpenAiClient, OpenAiConfig,
};

/// Environment variables holding each provider's key, in lookup order.
fn key_variables(provider: LlmProvider) -> &'static [&'static str] {
    match provider {
        LlmProvider::OpenAi => &["OPENAI_API_KEY", "OPENAI_KEY"],
        LlmProvider::Anthropic => &["ANTHROPIC_API_KEY"],
        LlmProvider::Mock => &[],
    }
}

/// Looks up the provider's credential in the environment.
///
/// Empty values count as absent.
pub fn resolve_api_key(provider: LlmProvider) -> Option<String> {
    key_variables(provider)
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .map(|key| key.trim().to_string())
        .find(|key| !key.is_empty())
}

/// Creates an LLM client for the given provider.
///
/// If `api_key` is provided, it takes precedence over environment variables.
/// The model comes from `config.model`, then `OPENAI_MODEL` / `ANTHROPIC_MODEL`,
/// then the provider default.
pub fn create_client(
    provider: LlmProvider,
    api_key: Option<String>,
    config: &LlmConfig,
) -> Result<Box<dyn LlmClient>> {
    let key = || {
        api_key
            .clone()
            .or_else(|| resolve_api_key(provider))
            .ok_or_else(|| {
                AskError::llm(format!(
                    "No API key configured. Set {}.",
                    key_variables(provider).join(" or ")
                ))
            })
    };

    match provider {
        LlmProvider::OpenAi => {
            let model = model_name(config, "OPENAI_MODEL", openai::DEFAULT_MODEL);
            let client_config = OpenAiConfig::new(key()?, model)
                .with_timeout(config.timeout_secs)
                .with_sampling(config.max_tokens, config.temperature);
            Ok(Box::new(OpenAiClient::new(client_config)?))
        }
        LlmProvider::Anthropic => {
            let model = model_name(config, "ANTHROPIC_MODEL", anthropic::DEFAULT_MODEL);
            let client_config = AnthropicConfig::new(key()?, model)
                .with_timeout(config.timeout_secs)
                .with_sampling(config.max_tokens, config.temperature);
            Ok(Box::new(AnthropicClient::new(client_config)?))
        }
        LlmProvider::Mock => Ok(Box::new(MockLlmClient::new())),
    }
}

fn model_name(config: &LlmConfig, env_var: &str, default: &str) -> String {
    config
        .model
        .clone()
        .or_else(|| std::env::var(env_var).ok().filter(|m| !m.trim().is_empty()))
        .unwrap_or_else(|| default.to_string())
}
