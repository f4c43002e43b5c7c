//! Request and Response Model
//!
//! Immutable value types that cross the gateway boundary: the generation
//! request, the provider identity, token counts, and the final response.

use serde::{Deserialize, Serialize};

use crate::types::{CostwiseError, Result};

// =============================================================================
// Provider Identity
// =============================================================================

/// Closed set of configured backends, in cost order.
///
/// Serialized names match the wire format of the usage log, so records written
/// by earlier deployments keep parsing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum ProviderId {
    /// Free-tier backend, limited by a rolling daily request quota
    #[serde(rename = "gemini")]
    Gemini,
    /// Cheap paid tier
    #[serde(rename = "gpt-5-nano")]
    Gpt5Nano,
    /// Premium paid tier
    #[serde(rename = "gpt-5-mini")]
    Gpt5Mini,
}

impl ProviderId {
    /// All identities, in tier priority order.
    pub const ALL: [ProviderId; 3] = [
        ProviderId::Gemini,
        ProviderId::Gpt5Nano,
        ProviderId::Gpt5Mini,
    ];

    /// Stable string form, identical to the serialized representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Gemini => "gemini",
            ProviderId::Gpt5Nano => "gpt-5-nano",
            ProviderId::Gpt5Mini => "gpt-5-mini",
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Token Counts
// =============================================================================

/// Input/output token counts for one completed call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCounts {
    pub input: u32,
    pub output: u32,
}

impl TokenCounts {
    pub fn new(input: u32, output: u32) -> Self {
        Self { input, output }
    }

    pub fn total(&self) -> u32 {
        self.input + self.output
    }
}

// =============================================================================
// Generation Request
// =============================================================================

/// Per-call overrides for model selection and sampling.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationOverrides {
    /// Model name override (provider-specific)
    pub model: Option<String>,
    /// Sampling temperature override
    pub temperature: Option<f32>,
    /// Cap on generated tokens
    pub max_tokens: Option<u32>,
}

/// A single generation request. Constructed once, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    prompt: String,
    system_instruction: Option<String>,
    overrides: GenerationOverrides,
}

impl GenerationRequest {
    /// Create a request from a prompt. The prompt must be non-empty.
    pub fn new(prompt: impl Into<String>) -> Result<Self> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(CostwiseError::InvalidRequest(
                "prompt must not be empty".to_string(),
            ));
        }
        Ok(Self {
            prompt,
            system_instruction: None,
            overrides: GenerationOverrides::default(),
        })
    }

    /// Attach a system instruction.
    pub fn with_system(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    /// Attach per-call overrides.
    pub fn with_overrides(mut self, overrides: GenerationOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn system_instruction(&self) -> Option<&str> {
        self.system_instruction.as_deref()
    }

    pub fn overrides(&self) -> &GenerationOverrides {
        &self.overrides
    }
}

// =============================================================================
// AI Response
// =============================================================================

/// The result of one gateway call: content plus cost metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct AiResponse {
    /// The provider's raw text output
    pub content: String,
    /// Which backend served the request
    pub provider: ProviderId,
    /// Token counts, reported by the provider or estimated from text lengths
    pub tokens: TokenCounts,
    /// Incurred cost in USD. Exactly 0.0 for the free tier.
    pub cost: f64,
}

// =============================================================================
// Tests
// =============================================================================
