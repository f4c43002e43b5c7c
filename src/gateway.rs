//! Orchestration Facade
//!
//! The single entry point callers use: route a generation request through the
//! fallback router, then account for the completed call in the usage ledger.
//! Recording is non-fatal; the response is returned to the caller even when
//! the ledger write fails.

use std::sync::Arc;

use crate::config::Config;
use crate::ledger::{UsageEvent, UsageLedger};
use crate::provider::{FallbackRouter, RouterStats};
use crate::report::CostReporter;
use crate::types::{AiResponse, GenerationRequest, Result};

pub struct AiGateway {
    router: FallbackRouter,
    ledger: Arc<UsageLedger>,
}

impl AiGateway {
    pub fn new(router: FallbackRouter, ledger: Arc<UsageLedger>) -> Self {
        Self { router, ledger }
    }

    /// Wire up the standard gateway: tier order from configuration, JSONL
    /// ledger under the configured log directory.
    pub fn from_config(config: &Config) -> Result<Self> {
        let router = FallbackRouter::from_config(config)?;
        let ledger = Arc::new(UsageLedger::jsonl(&config.ledger.log_dir));
        Ok(Self::new(router, ledger))
    }

    /// Generate a completion and account for it.
    ///
    /// `operation` tags the ledger record (e.g. "issue-analysis",
    /// "code-generation"); `issue_number` correlates it with the triggering
    /// issue when there is one.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
        operation: &str,
        issue_number: Option<u64>,
    ) -> Result<AiResponse> {
        let response = self.router.generate(request).await?;

        // Accounting must never fail the response path; the ledger swallows
        // its own write errors.
        self.ledger
            .record(UsageEvent {
                provider: response.provider,
                tokens: response.tokens,
                cost: response.cost,
                operation: operation.to_string(),
                issue_number,
            })
            .await;

        Ok(response)
    }

    /// Free-tier quota snapshot from the router.
    pub fn router_stats(&self) -> Option<RouterStats> {
        self.router.stats()
    }

    /// The ledger, for dashboard-style consumers.
    pub fn ledger(&self) -> Arc<UsageLedger> {
        Arc::clone(&self.ledger)
    }

    /// A reporter bound to this gateway's ledger.
    pub fn reporter(&self) -> CostReporter {
        CostReporter::new(self.ledger())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{
        Completion, CompletionProvider, PriceTable, ProviderTier,
    };
    use crate::types::{CostwiseError, ProviderId};
    use async_trait::async_trait;

    struct MockProvider {
        name: String,
        should_fail: bool,
        input_tokens: u32,
        output_tokens: u32,
    }

    #[async_trait]
    impl CompletionProvider for MockProvider {
        async fn complete(&self, _request: &GenerationRequest) -> Result<Completion> {
            if self.should_fail {
                return Err(CostwiseError::provider(&self.name, "simulated outage"));
            }
            Ok(Completion {
                text: format!("response from {}", self.name),
                input_tokens: self.input_tokens,
                output_tokens: self.output_tokens,
            })
        }

        fn name(&self) -> &str {
            &self.name
        }
    }

    fn mock(name: &str, should_fail: bool, input: u32, output: u32) -> Arc<MockProvider> {
        Arc::new(MockProvider {
            name: name.to_string(),
            should_fail,
            input_tokens: input,
            output_tokens: output,
        })
    }

    #[tokio::test]
    async fn test_generate_records_exactly_one_usage_entry() {
        // Free tier fails once, mid tier succeeds with 100/50 tokens
        let router = FallbackRouter::new(vec![
            ProviderTier::free(ProviderId::Gemini, mock("gemini", true, 0, 0)),
            ProviderTier::new(
                ProviderId::Gpt5Nano,
                mock("nano", false, 100, 50),
                PriceTable::GPT5_NANO,
            ),
        ])
        .unwrap();
        let gateway = AiGateway::new(router, Arc::new(UsageLedger::in_memory()));

        let request = GenerationRequest::new("triage this").unwrap();
        let response = gateway
            .generate(&request, "issue-analysis", Some(1501))
            .await
            .unwrap();

        let expected_cost = (100.0 / 1e6) * 0.05 + (50.0 / 1e6) * 0.40;
        assert_eq!(response.provider, ProviderId::Gpt5Nano);
        assert_eq!(response.cost, expected_cost);

        let records = gateway.ledger().query(None, None).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].provider, ProviderId::Gpt5Nano);
        assert_eq!(records[0].cost, expected_cost);
        assert_eq!(records[0].operation, "issue-analysis");
        assert_eq!(records[0].issue_number, Some(1501));
    }

    #[tokio::test]
    async fn test_exhaustion_records_nothing() {
        let router = FallbackRouter::new(vec![ProviderTier::free(
            ProviderId::Gemini,
            mock("gemini", true, 0, 0),
        )])
        .unwrap();
        let gateway = AiGateway::new(router, Arc::new(UsageLedger::in_memory()));

        let request = GenerationRequest::new("hello").unwrap();
        let err = gateway.generate(&request, "chat", None).await.unwrap_err();
        assert!(matches!(err, CostwiseError::Exhausted { .. }));
        assert!(gateway.ledger().query(None, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_response_survives_broken_ledger() {
        struct BrokenStore;

        #[async_trait]
        impl crate::ledger::UsageStore for BrokenStore {
            async fn append(&self, _record: &crate::ledger::UsageRecord) -> Result<()> {
                Err(CostwiseError::LedgerWrite("disk full".to_string()))
            }
            async fn load(&self) -> Result<Vec<crate::ledger::UsageRecord>> {
                Ok(Vec::new())
            }
        }

        let router = FallbackRouter::new(vec![ProviderTier::free(
            ProviderId::Gemini,
            mock("gemini", false, 8, 2),
        )])
        .unwrap();
        let gateway = AiGateway::new(
            router,
            Arc::new(UsageLedger::new(Arc::new(BrokenStore))),
        );

        let request = GenerationRequest::new("hello").unwrap();
        let response = gateway.generate(&request, "chat", None).await.unwrap();
        assert_eq!(response.provider, ProviderId::Gemini);
        assert_eq!(response.cost, 0.0);
    }

    #[tokio::test]
    async fn test_reporter_sees_gateway_traffic() {
        let router = FallbackRouter::new(vec![ProviderTier::free(
            ProviderId::Gemini,
            mock("gemini", false, 8, 2),
        )])
        .unwrap();
        let gateway = AiGateway::new(router, Arc::new(UsageLedger::in_memory()));

        let request = GenerationRequest::new("hello").unwrap();
        gateway.generate(&request, "chat", None).await.unwrap();

        let report = gateway.reporter().report(1).await.unwrap();
        assert_eq!(report.total_requests, 1);
        assert_eq!(report.total_cost, 0.0);
    }
}
