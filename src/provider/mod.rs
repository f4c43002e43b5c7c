//! AI Provider Abstraction
//!
//! Defines the `CompletionProvider` trait for text generation backends.
//! All providers return a `Completion` with token counts so the router can
//! price every call from a fixed table.
//!
//! ## Modules
//!
//! - `router`: Fallback router with strict tier priority and quota gating
//! - `quota`: Rolling-window request quota for the free tier
//! - `gemini`: Free-tier Gemini backend
//! - `openai`: Paid OpenAI chat backend (nano and mini tiers)

mod gemini;
mod openai;
pub mod quota;
mod router;

pub use gemini::GeminiProvider;
pub use openai::OpenAiChatProvider;
pub use quota::{QuotaState, TierQuota};
pub use router::{FallbackRouter, ProviderTier, RouterStats};

use async_trait::async_trait;
use std::sync::Arc;

use crate::constants::{estimate, pricing};
use crate::types::Result;

// =============================================================================
// Completion
// =============================================================================

/// Raw output of a single provider call: text plus token counts.
///
/// Providers that report usage fill the counts from the API response; the
/// rest estimate both sides with [`estimate_tokens`] so costs stay
/// reproducible from logged text lengths.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

// =============================================================================
// Provider Trait
// =============================================================================

/// A single text-generation backend.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Execute one generation call.
    async fn complete(&self, request: &crate::types::GenerationRequest) -> Result<Completion>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

/// Shared provider handle for tier descriptors and tests.
pub type SharedProvider = Arc<dyn CompletionProvider>;

// =============================================================================
// Price Table
// =============================================================================

/// Fixed published prices for one tier, in USD per million tokens.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PriceTable {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

impl PriceTable {
    /// The free tier: every call costs exactly zero.
    pub const FREE: PriceTable = PriceTable {
        input_per_million: 0.0,
        output_per_million: 0.0,
    };

    /// GPT-5 nano published prices.
    pub const GPT5_NANO: PriceTable = PriceTable {
        input_per_million: pricing::NANO_INPUT_PER_M,
        output_per_million: pricing::NANO_OUTPUT_PER_M,
    };

    /// GPT-5 mini published prices.
    pub const GPT5_MINI: PriceTable = PriceTable {
        input_per_million: pricing::MINI_INPUT_PER_M,
        output_per_million: pricing::MINI_OUTPUT_PER_M,
    };

    /// Cost of a call in USD. Pure function of the token counts.
    pub fn cost(&self, input_tokens: u32, output_tokens: u32) -> f64 {
        (input_tokens as f64 / 1_000_000.0) * self.input_per_million
            + (output_tokens as f64 / 1_000_000.0) * self.output_per_million
    }
}

// =============================================================================
// Token Estimation
// =============================================================================

/// Estimate the token count of a text when the provider does not report one.
///
/// Roughly 4 characters per token, rounded up. Applied to both the full input
/// (system instruction + prompt) and the response text.
pub fn estimate_tokens(text: &str) -> u32 {
    text.chars().count().div_ceil(estimate::CHARS_PER_TOKEN) as u32
}

// =============================================================================
// Tests
// =============================================================================
