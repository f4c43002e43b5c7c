//! Gemini API Provider (free tier)
//!
//! Generation backend using Google's `generateContent` API. The system
//! instruction is folded into the prompt text, and token counts are estimated
//! from the exact texts sent and received so that logged costs can be
//! reproduced from text lengths alone.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use super::{Completion, CompletionProvider, estimate_tokens};
use crate::config::GenerationConfig;
use crate::types::{CostwiseError, GenerationRequest, Result};

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Free-tier Gemini provider with secure API key handling
pub struct GeminiProvider {
    /// API key stored securely - never exposed in logs or debug output
    api_key: SecretString,
    api_base: String,
    model: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl GeminiProvider {
    pub fn new(
        api_key: SecretString,
        model: Option<String>,
        generation: &GenerationConfig,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(generation.timeout_secs))
            .build()
            .map_err(|e| {
                CostwiseError::provider("gemini", format!("failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            api_key,
            api_base: DEFAULT_API_BASE.to_string(),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            client,
        })
    }

    /// Create from the `GEMINI_API_KEY` environment variable.
    pub fn from_env(generation: &GenerationConfig) -> Result<Self> {
        let key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| CostwiseError::Config("GEMINI_API_KEY not set".to_string()))?;
        Self::new(SecretString::from(key), None, generation)
    }

    /// Combine system instruction and prompt into the single text the API
    /// receives. Token estimation runs over this full text.
    fn full_prompt(request: &GenerationRequest) -> String {
        match request.system_instruction() {
            Some(system) => format!("{system}\n\n{}", request.prompt()),
            None => request.prompt().to_string(),
        }
    }

    fn build_request(&self, full_prompt: &str, request: &GenerationRequest) -> GenerateRequest {
        GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: full_prompt.to_string(),
                }],
            }],
            generation_config: GenerationParams {
                temperature: request.overrides().temperature,
                max_output_tokens: request.overrides().max_tokens,
            },
        }
    }
}

#[async_trait]
impl CompletionProvider for GeminiProvider {
    async fn complete(&self, request: &GenerationRequest) -> Result<Completion> {
        let model = request.overrides().model.as_deref().unwrap_or(&self.model);
        info!(model, "Generating with Gemini");

        let full_prompt = Self::full_prompt(request);
        let url = format!("{}/models/{}:generateContent", self.api_base, model);
        let body = self.build_request(&full_prompt, request);

        debug!("Sending request to Gemini API");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| CostwiseError::provider("gemini", format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CostwiseError::provider(
                "gemini",
                format!("API error ({status}): {body}"),
            ));
        }

        let response_body: GenerateResponse = response.json().await.map_err(|e| {
            CostwiseError::provider("gemini", format!("failed to parse response: {e}"))
        })?;

        let text = response_body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| CostwiseError::provider("gemini", "no content in response"))?;

        // The free tier estimates both sides from text lengths; this keeps
        // recorded costs reproducible from the logged texts.
        Ok(Completion {
            input_tokens: estimate_tokens(&full_prompt),
            output_tokens: estimate_tokens(&text),
            text,
        })
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationParams,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(rename = "maxOutputTokens", skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}
