//! Costwise - Cost-Minimizing AI Gateway
//!
//! Routes generation requests across multiple AI backends under a
//! cost-minimization policy: the free tier is attempted first while its
//! rolling daily quota lasts, then the paid tiers in price order. Every
//! completed call is accounted for in an append-only usage ledger that feeds
//! daily, monthly, and windowed cost reports.
//!
//! ## Core Components
//!
//! - **Fallback Router**: strict tier priority with free-tier quota gating
//! - **Usage Ledger**: append-only JSONL record stream with on-demand
//!   aggregation and a daily-summary snapshot
//! - **Cost Reporter**: trailing-window reports and free-tier limit status
//! - **Gateway**: the single entry point tying routing and accounting together
//!
//! ## Quick Start
//!
//! ```ignore
//! use costwise::{AiGateway, ConfigLoader, GenerationRequest};
//!
//! let config = ConfigLoader::load()?;
//! let gateway = AiGateway::from_config(&config)?;
//! let request = GenerationRequest::new("summarize this issue")?
//!     .with_system("you are a triage assistant");
//! let response = gateway.generate(&request, "issue-analysis", Some(42)).await?;
//! println!("{} (${:.6} via {})", response.content, response.cost, response.provider);
//! ```
//!
//! ## Modules
//!
//! - [`provider`]: backend trait, free/paid clients, quota, fallback router
//! - [`ledger`]: usage records, durable stores, summaries, snapshots
//! - [`report`]: cost reports and limit status
//! - [`gateway`]: orchestration facade
//! - [`webhook`]: signed-event collaborator (HMAC verification + dispatch)
//! - [`config`]: layered configuration

pub mod cli;
pub mod config;
pub mod constants;
pub mod gateway;
pub mod ledger;
pub mod provider;
pub mod report;
pub mod types;
pub mod webhook;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader};

// Error Types
pub use types::error::{CostwiseError, Result};

// Request/Response Model
pub use types::{AiResponse, GenerationOverrides, GenerationRequest, ProviderId, TokenCounts};

// =============================================================================
// Subsystem Re-exports
// =============================================================================

pub use gateway::AiGateway;
pub use ledger::{UsageEvent, UsageLedger, UsageRecord, UsageStore, UsageSummary};
pub use provider::{
    CompletionProvider, FallbackRouter, GeminiProvider, OpenAiChatProvider, PriceTable,
    ProviderTier, RouterStats, TierQuota,
};
pub use report::{CostReport, CostReporter, LimitStatus};
pub use webhook::{EventStatus, SignatureVerifier, WebhookOutcome, WebhookProcessor};
