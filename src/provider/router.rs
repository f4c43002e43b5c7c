//! Fallback Provider Router
//!
//! Routes each generation request across the configured backends under a
//! cost-minimization policy: tiers are attempted strictly in list order, the
//! free tier is gated by its rolling quota, and a tier failure falls through
//! to the next tier without retrying. The call fails only when every
//! configured tier has been attempted (or skipped for quota) without success.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::quota::TierQuota;
use super::{PriceTable, SharedProvider};
use crate::config::Config;
use crate::types::{AiResponse, CostwiseError, GenerationRequest, ProviderId, Result, TokenCounts};

// =============================================================================
// Provider Tier
// =============================================================================

/// One backend in the priority order: a capability handle, its fixed price
/// table, and an optional admission quota.
pub struct ProviderTier {
    pub id: ProviderId,
    pub provider: SharedProvider,
    pub pricing: PriceTable,
    pub quota: Option<TierQuota>,
}

impl ProviderTier {
    pub fn new(id: ProviderId, provider: SharedProvider, pricing: PriceTable) -> Self {
        Self {
            id,
            provider,
            pricing,
            quota: None,
        }
    }

    /// Gate this tier behind a request quota.
    pub fn with_quota(mut self, quota: TierQuota) -> Self {
        self.quota = Some(quota);
        self
    }

    /// Standard free tier: zero cost, daily request quota.
    pub fn free(id: ProviderId, provider: SharedProvider) -> Self {
        Self::new(id, provider, PriceTable::FREE).with_quota(TierQuota::daily_free(Utc::now()))
    }
}

impl std::fmt::Debug for ProviderTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderTier")
            .field("id", &self.id)
            .field("pricing", &self.pricing)
            .field("quota", &self.quota)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Router Stats
// =============================================================================

/// Snapshot of the free tier's quota, for dashboards and status output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouterStats {
    /// Requests consumed in the current window
    pub free_used: u32,
    /// Requests left before the free tier is skipped
    pub free_remaining: u32,
    /// When the window rolls and the counter resets
    pub next_reset: chrono::DateTime<Utc>,
}

// =============================================================================
// Fallback Router
// =============================================================================

/// Ordered fallback over the configured tiers.
pub struct FallbackRouter {
    tiers: Vec<ProviderTier>,
}

impl FallbackRouter {
    /// Create a router. Fails immediately when no tier is configured; a
    /// router that could never serve a request must not be constructed.
    pub fn new(tiers: Vec<ProviderTier>) -> Result<Self> {
        if tiers.is_empty() {
            return Err(CostwiseError::Config(
                "at least one provider must be configured".to_string(),
            ));
        }
        Ok(Self { tiers })
    }

    /// Assemble the standard tier order from configuration: Gemini free tier
    /// first, then GPT-5 nano, then GPT-5 mini. A tier is present when its
    /// section is enabled and an API key can be resolved (config value or
    /// environment variable).
    pub fn from_config(config: &Config) -> Result<Self> {
        let generation = &config.generation;
        let mut tiers = Vec::new();

        if config.providers.gemini.enabled
            && let Some(key) = config.providers.gemini.resolve_key()
        {
            let provider = super::GeminiProvider::new(
                key,
                Some(config.providers.gemini.model.clone()),
                generation,
            )?;
            tiers.push(ProviderTier::free(ProviderId::Gemini, Arc::new(provider)));
        }

        if config.providers.openai.enabled
            && let Some(key) = config.providers.openai.resolve_key()
        {
            let nano = super::OpenAiChatProvider::new(
                key,
                config.providers.openai.nano_model.clone(),
                generation,
            )?;
            tiers.push(ProviderTier::new(
                ProviderId::Gpt5Nano,
                Arc::new(nano),
                PriceTable::GPT5_NANO,
            ));

            // resolve_key cannot fail here after succeeding above
            if let Some(key) = config.providers.openai.resolve_key() {
                let mini = super::OpenAiChatProvider::new(
                    key,
                    config.providers.openai.mini_model.clone(),
                    generation,
                )?;
                tiers.push(ProviderTier::new(
                    ProviderId::Gpt5Mini,
                    Arc::new(mini),
                    PriceTable::GPT5_MINI,
                ));
            }
        }

        if tiers.is_empty() {
            return Err(CostwiseError::Config(
                "no provider credentials available (set GEMINI_API_KEY or OPENAI_API_KEY)"
                    .to_string(),
            ));
        }

        Self::new(tiers)
    }

    /// Route one request through the tier order.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<AiResponse> {
        let mut attempts = 0usize;
        let mut last_error: Option<CostwiseError> = None;

        for tier in &self.tiers {
            if let Some(quota) = &tier.quota
                && !quota.admit(Utc::now())
            {
                debug!(provider = %tier.id, "Skipping tier (quota exhausted)");
                continue;
            }

            attempts += 1;
            debug!(provider = %tier.id, attempt = attempts, "Attempting tier");

            match tier.provider.complete(request).await {
                Ok(completion) => {
                    // Quota is consumed on success only; a failed attempt
                    // must not count against the window.
                    if let Some(quota) = &tier.quota {
                        quota.record_use(Utc::now());
                    }

                    let tokens =
                        TokenCounts::new(completion.input_tokens, completion.output_tokens);
                    let cost = tier.pricing.cost(tokens.input, tokens.output);

                    info!(
                        provider = %tier.id,
                        input_tokens = tokens.input,
                        output_tokens = tokens.output,
                        cost,
                        "Generation succeeded"
                    );

                    return Ok(AiResponse {
                        content: completion.text,
                        provider: tier.id,
                        tokens,
                        cost,
                    });
                }
                Err(err) => {
                    warn!(provider = %tier.id, error = %err, "Tier failed, falling through");
                    last_error = Some(err);
                }
            }
        }

        Err(CostwiseError::Exhausted {
            attempts,
            last: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no eligible provider".to_string()),
        })
    }

    /// Free-tier quota snapshot, taken from the first quota-gated tier.
    /// `None` when no tier carries a quota (paid-only configuration).
    pub fn stats(&self) -> Option<RouterStats> {
        let now = Utc::now();
        self.tiers
            .iter()
            .find_map(|tier| tier.quota.as_ref().map(|q| (q, q.snapshot(now))))
            .map(|(quota, state)| RouterStats {
                free_used: state.used,
                free_remaining: quota.limit().saturating_sub(state.used),
                next_reset: state.next_reset(quota.window()),
            })
    }

    pub fn tier_ids(&self) -> Vec<ProviderId> {
        self.tiers.iter().map(|t| t.id).collect()
    }
}

impl std::fmt::Debug for FallbackRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackRouter")
            .field("tiers", &self.tier_ids())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
