//! OpenAI API Provider (paid tiers)
//!
//! Generation backend using OpenAI's Chat Completions API. One client type
//! serves both paid tiers; the model name is the only difference between
//! them. Token counts come from the API's usage block, with text-length
//! estimation as the fallback when the block is absent.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use super::{Completion, CompletionProvider, estimate_tokens};
use crate::config::GenerationConfig;
use crate::types::{CostwiseError, GenerationRequest, Result};

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Paid-tier OpenAI provider with secure API key handling
pub struct OpenAiChatProvider {
    /// API key stored securely - never exposed in logs or debug output
    api_key: SecretString,
    api_base: String,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiChatProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiChatProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl OpenAiChatProvider {
    pub fn new(
        api_key: SecretString,
        model: impl Into<String>,
        generation: &GenerationConfig,
    ) -> Result<Self> {
        let model = model.into();
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(generation.timeout_secs))
            .build()
            .map_err(|e| {
                CostwiseError::provider(&model, format!("failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            api_key,
            api_base: DEFAULT_API_BASE.to_string(),
            model,
            temperature: generation.temperature,
            max_tokens: generation.max_tokens,
            client,
        })
    }

    /// Create from the `OPENAI_API_KEY` environment variable.
    pub fn from_env(model: impl Into<String>, generation: &GenerationConfig) -> Result<Self> {
        let key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| CostwiseError::Config("OPENAI_API_KEY not set".to_string()))?;
        Self::new(SecretString::from(key), model, generation)
    }

    fn build_request(&self, request: &GenerationRequest) -> ChatCompletionRequest {
        let mut messages = Vec::new();
        if let Some(system) = request.system_instruction() {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.to_string(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: request.prompt().to_string(),
        });

        ChatCompletionRequest {
            model: request
                .overrides()
                .model
                .clone()
                .unwrap_or_else(|| self.model.clone()),
            messages,
            temperature: request.overrides().temperature.unwrap_or(self.temperature),
            max_tokens: request.overrides().max_tokens.or(self.max_tokens),
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiChatProvider {
    async fn complete(&self, request: &GenerationRequest) -> Result<Completion> {
        info!(model = %self.model, "Generating with OpenAI");

        let body = self.build_request(request);
        let url = format!("{}/chat/completions", self.api_base);

        debug!("Sending request to OpenAI API");

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| CostwiseError::provider(&self.model, format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CostwiseError::provider(
                &self.model,
                format!("API error ({status}): {body}"),
            ));
        }

        let response_body: ChatCompletionResponse = response.json().await.map_err(|e| {
            CostwiseError::provider(&self.model, format!("failed to parse response: {e}"))
        })?;

        let text = response_body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        let (input_tokens, output_tokens) = match response_body.usage {
            Some(usage) => (usage.prompt_tokens, usage.completion_tokens),
            None => {
                let input = body
                    .messages
                    .iter()
                    .map(|m| estimate_tokens(&m.content))
                    .sum();
                (input, estimate_tokens(&text))
            }
        };

        Ok(Completion {
            text,
            input_tokens,
            output_tokens,
        })
    }

    fn name(&self) -> &str {
        &self.model
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<UsageInfo>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageInfo {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> OpenAiChatProvider {
        OpenAiChatProvider::new(
            SecretString::from("test-key"),
            "gpt-5-nano",
            &GenerationConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_request_includes_system_message() {
        let request = GenerationRequest::new("classify this")
            .unwrap()
            .with_system("you label issues");
        let body = provider().build_request(&request);

        assert_eq!(body.messages.len(), 2);
        assert_eq!(body.messages[0].role, "system");
        assert_eq!(body.messages[1].role, "user");
        assert_eq!(body.messages[1].content, "classify this");
    }

    #[test]
    fn test_request_default_temperature() {
        let request = GenerationRequest::new("hi").unwrap();
        let body = provider().build_request(&request);
        assert_eq!(body.temperature, GenerationConfig::default().temperature);
        assert_eq!(body.model, "gpt-5-nano");
    }

    #[test]
    fn test_overrides_take_precedence() {
        let request = GenerationRequest::new("hi").unwrap().with_overrides(
            crate::types::GenerationOverrides {
                model: Some("gpt-5-mini".to_string()),
                temperature: Some(0.1),
                max_tokens: Some(256),
            },
        );
        let body = provider().build_request(&request);
        assert_eq!(body.model, "gpt-5-mini");
        assert_eq!(body.temperature, 0.1);
        assert_eq!(body.max_tokens, Some(256));
    }

    #[test]
    fn test_debug_redacts_key() {
        let debug = format!("{:?}", provider());
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("test-key"));
    }
}
