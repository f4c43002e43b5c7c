//! Cost Report Generator
//!
//! Read-only projections over the ledger: a trailing-window cost report and
//! the free-tier limit status. Both are pure functions of the ledger's query
//! results with no side effects of their own.
//!
//! The limit status counts free-tier calls for the current UTC calendar day,
//! while the router's quota window rolls 24 h after its last reset; near
//! midnight the two figures can disagree. The two clocks are deliberately
//! kept separate.

use chrono::{Duration, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::constants::quota;
use crate::ledger::UsageLedger;
use crate::types::{ProviderId, Result};

// =============================================================================
// Cost Report
// =============================================================================

/// Per-provider slice of a report window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProviderBreakdown {
    pub requests: u64,
    pub cost: f64,
}

/// Aggregates over a trailing window of `days` days ending now.
#[derive(Debug, Clone, PartialEq)]
pub struct CostReport {
    pub days: i64,
    pub start: chrono::DateTime<Utc>,
    pub end: chrono::DateTime<Utc>,
    pub total_requests: u64,
    pub total_cost: f64,
    pub by_provider: BTreeMap<ProviderId, ProviderBreakdown>,
    /// 0.0 when the window holds no requests
    pub average_cost: f64,
}

impl std::fmt::Display for CostReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Cost Report (Last {} Days)", self.days)?;
        writeln!(f, "==================================")?;
        writeln!(f)?;
        writeln!(f, "Total Requests: {}", self.total_requests)?;
        writeln!(f, "Total Cost: ${:.4}", self.total_cost)?;
        writeln!(f)?;
        writeln!(f, "By Provider:")?;
        for (provider, breakdown) in &self.by_provider {
            writeln!(
                f,
                "- {}: {} requests (${:.4})",
                provider, breakdown.requests, breakdown.cost
            )?;
        }
        writeln!(f)?;
        writeln!(f, "Average Cost per Request: ${:.6}", self.average_cost)?;
        writeln!(f)?;
        write!(
            f,
            "Date Range: {} - {}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

// =============================================================================
// Limit Status
// =============================================================================

/// Free-tier headroom for the current UTC calendar day.
#[derive(Debug, Clone, PartialEq)]
pub struct LimitStatus {
    pub warning: bool,
    /// May go negative when the calendar-day count exceeds the limit
    pub remaining: i64,
    pub message: String,
}

// =============================================================================
// Cost Reporter
// =============================================================================

pub struct CostReporter {
    ledger: Arc<UsageLedger>,
}

impl CostReporter {
    pub fn new(ledger: Arc<UsageLedger>) -> Self {
        Self { ledger }
    }

    /// Build a report over the trailing `days` days (end = now).
    pub async fn report(&self, days: i64) -> Result<CostReport> {
        let end = Utc::now();
        let start = end - Duration::days(days);
        let records = self.ledger.query(Some(start), Some(end)).await?;

        let mut by_provider: BTreeMap<ProviderId, ProviderBreakdown> = BTreeMap::new();
        for id in ProviderId::ALL {
            by_provider.insert(id, ProviderBreakdown::default());
        }

        let mut total_cost = 0.0;
        for record in &records {
            let entry = by_provider.entry(record.provider).or_default();
            entry.requests += 1;
            entry.cost += record.cost;
            total_cost += record.cost;
        }

        let total_requests = records.len() as u64;
        let average_cost = if total_requests > 0 {
            total_cost / total_requests as f64
        } else {
            0.0
        };

        Ok(CostReport {
            days,
            start,
            end,
            total_requests,
            total_cost,
            by_provider,
            average_cost,
        })
    }

    /// Free-tier limit status from today's calendar-day summary.
    pub async fn limit_status(&self) -> Result<LimitStatus> {
        let today = self.ledger.daily_summary(Utc::now().date_naive()).await?;
        let used = today.requests_for(ProviderId::Gemini) as i64;
        let remaining = quota::DAILY_FREE_LIMIT as i64 - used;
        let warning = remaining < quota::WARN_REMAINING;

        let mut message = format!(
            "Gemini: {}/{} requests used today ({} remaining)",
            used,
            quota::DAILY_FREE_LIMIT,
            remaining
        );
        if warning {
            message.push_str(" - approaching daily limit!");
        }

        Ok(LimitStatus {
            warning,
            remaining,
            message,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::UsageEvent;
    use crate::types::TokenCounts;

    fn event(provider: ProviderId, cost: f64) -> UsageEvent {
        UsageEvent {
            provider,
            tokens: TokenCounts::new(100, 50),
            cost,
            operation: "code-generation".to_string(),
            issue_number: None,
        }
    }

    #[tokio::test]
    async fn test_report_empty_window_has_zero_average() {
        let reporter = CostReporter::new(Arc::new(UsageLedger::in_memory()));
        let report = reporter.report(7).await.unwrap();

        assert_eq!(report.total_requests, 0);
        assert_eq!(report.total_cost, 0.0);
        assert_eq!(report.average_cost, 0.0);
        // Every provider is listed even with no traffic
        assert_eq!(report.by_provider.len(), ProviderId::ALL.len());
    }

    #[tokio::test]
    async fn test_report_aggregates_trailing_window() {
        let ledger = Arc::new(UsageLedger::in_memory());
        let now = Utc::now();

        ledger.record_at(event(ProviderId::Gemini, 0.0), now - Duration::days(1)).await;
        ledger
            .record_at(event(ProviderId::Gpt5Nano, 0.004), now - Duration::days(2))
            .await;
        // Outside the 7-day window
        ledger
            .record_at(event(ProviderId::Gpt5Mini, 9.99), now - Duration::days(8))
            .await;

        let report = CostReporter::new(ledger).report(7).await.unwrap();
        assert_eq!(report.total_requests, 2);
        assert!((report.total_cost - 0.004).abs() < 1e-12);
        assert!((report.average_cost - 0.002).abs() < 1e-12);
        assert_eq!(report.by_provider[&ProviderId::Gpt5Mini].requests, 0);
    }

    #[tokio::test]
    async fn test_report_display_renders_sections() {
        let ledger = Arc::new(UsageLedger::in_memory());
        ledger.record(event(ProviderId::Gpt5Nano, 0.0125)).await;

        let report = CostReporter::new(ledger).report(7).await.unwrap();
        let text = report.to_string();

        assert!(text.contains("Cost Report (Last 7 Days)"));
        assert!(text.contains("Total Requests: 1"));
        assert!(text.contains("- gpt-5-nano: 1 requests ($0.0125)"));
        assert!(text.contains("Average Cost per Request:"));
        assert!(text.contains("Date Range:"));
    }

    #[tokio::test]
    async fn test_limit_status_no_usage() {
        let reporter = CostReporter::new(Arc::new(UsageLedger::in_memory()));
        let status = reporter.limit_status().await.unwrap();

        assert!(!status.warning);
        assert_eq!(status.remaining, 1500);
        assert!(status.message.contains("0/1500"));
    }

    #[tokio::test]
    async fn test_limit_status_warns_below_threshold() {
        let ledger = Arc::new(UsageLedger::in_memory());
        for _ in 0..1201 {
            ledger.record(event(ProviderId::Gemini, 0.0)).await;
        }

        let status = CostReporter::new(ledger).limit_status().await.unwrap();
        assert!(status.warning);
        assert_eq!(status.remaining, 299);
        assert!(status.message.contains("approaching daily limit"));
    }

    #[tokio::test]
    async fn test_limit_status_ignores_paid_tiers() {
        let ledger = Arc::new(UsageLedger::in_memory());
        for _ in 0..50 {
            ledger.record(event(ProviderId::Gpt5Mini, 0.1)).await;
        }

        let status = CostReporter::new(ledger).limit_status().await.unwrap();
        assert_eq!(status.remaining, 1500);
    }
}
