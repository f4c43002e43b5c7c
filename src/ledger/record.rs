//! Usage Records and Summaries
//!
//! One `UsageRecord` per completed provider call, serialized camelCase so
//! logs written by earlier deployments keep parsing. Summaries are derived on
//! demand and never authoritative.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{ProviderId, TokenCounts};

// =============================================================================
// Usage Record
// =============================================================================

/// Append-only record of one completed generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecord {
    pub timestamp: DateTime<Utc>,
    pub provider: ProviderId,
    pub tokens_input: u32,
    pub tokens_output: u32,
    pub cost: f64,
    /// Free-text operation tag supplied by the caller
    pub operation: String,
    /// Correlation id, e.g. the issue number that triggered the call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_number: Option<u64>,
}

impl UsageRecord {
    pub fn tokens(&self) -> TokenCounts {
        TokenCounts::new(self.tokens_input, self.tokens_output)
    }

    /// Inclusive containment check on both bounds.
    pub fn in_range(&self, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> bool {
        if let Some(start) = start
            && self.timestamp < start
        {
            return false;
        }
        if let Some(end) = end
            && self.timestamp > end
        {
            return false;
        }
        true
    }
}

// =============================================================================
// Usage Summary
// =============================================================================

/// Aggregates over a time range: per-provider request counts, per-provider
/// cost, and total cost. Every provider appears even with zero activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSummary {
    /// Range label: `YYYY-MM-DD` for days, `YYYY-MM` for months
    pub date: String,
    pub requests: BTreeMap<ProviderId, u64>,
    pub cost_by_provider: BTreeMap<ProviderId, f64>,
    pub total_cost: f64,
}

impl UsageSummary {
    /// Summary with zero counts and zero cost for every provider.
    pub fn empty(date: impl Into<String>) -> Self {
        let mut requests = BTreeMap::new();
        let mut cost_by_provider = BTreeMap::new();
        for id in ProviderId::ALL {
            requests.insert(id, 0);
            cost_by_provider.insert(id, 0.0);
        }
        Self {
            date: date.into(),
            requests,
            cost_by_provider,
            total_cost: 0.0,
        }
    }

    /// Fold a record stream into a summary. The caller filters the range.
    pub fn from_records<'a>(
        date: impl Into<String>,
        records: impl IntoIterator<Item = &'a UsageRecord>,
    ) -> Self {
        let mut summary = Self::empty(date);
        for record in records {
            *summary.requests.entry(record.provider).or_insert(0) += 1;
            *summary
                .cost_by_provider
                .entry(record.provider)
                .or_insert(0.0) += record.cost;
            summary.total_cost += record.cost;
        }
        summary
    }

    pub fn requests_for(&self, id: ProviderId) -> u64 {
        self.requests.get(&id).copied().unwrap_or(0)
    }

    pub fn cost_for(&self, id: ProviderId) -> f64 {
        self.cost_by_provider.get(&id).copied().unwrap_or(0.0)
    }

    pub fn total_requests(&self) -> u64 {
        self.requests.values().sum()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(hour: u32, provider: ProviderId, cost: f64) -> UsageRecord {
        UsageRecord {
            timestamp: Utc.with_ymd_and_hms(2025, 6, 1, hour, 0, 0).unwrap(),
            provider,
            tokens_input: 100,
            tokens_output: 50,
            cost,
            operation: "issue-analysis".to_string(),
            issue_number: Some(42),
        }
    }

    #[test]
    fn test_record_wire_format() {
        let json = serde_json::to_value(record(12, ProviderId::Gpt5Nano, 0.001)).unwrap();
        assert_eq!(json["provider"], "gpt-5-nano");
        assert!(json["tokensInput"].is_number());
        assert!(json["tokensOutput"].is_number());
        assert_eq!(json["issueNumber"], 42);
        assert_eq!(json["operation"], "issue-analysis");
    }

    #[test]
    fn test_absent_issue_number_is_omitted() {
        let mut r = record(12, ProviderId::Gemini, 0.0);
        r.issue_number = None;
        let json = serde_json::to_value(&r).unwrap();
        assert!(json.get("issueNumber").is_none());
    }

    #[test]
    fn test_in_range_bounds_are_inclusive() {
        let r = record(12, ProviderId::Gemini, 0.0);
        let ts = r.timestamp;

        assert!(r.in_range(Some(ts), Some(ts)));
        assert!(r.in_range(None, None));
        assert!(r.in_range(Some(ts - chrono::Duration::hours(1)), None));
        assert!(!r.in_range(Some(ts + chrono::Duration::seconds(1)), None));
        assert!(!r.in_range(None, Some(ts - chrono::Duration::seconds(1))));
    }

    #[test]
    fn test_empty_summary_covers_all_providers() {
        let summary = UsageSummary::empty("2025-06-01");
        for id in ProviderId::ALL {
            assert_eq!(summary.requests_for(id), 0);
            assert_eq!(summary.cost_for(id), 0.0);
        }
        assert_eq!(summary.total_cost, 0.0);
        assert_eq!(summary.total_requests(), 0);
    }

    #[test]
    fn test_from_records_aggregates_per_provider() {
        let records = vec![
            record(1, ProviderId::Gemini, 0.0),
            record(2, ProviderId::Gemini, 0.0),
            record(3, ProviderId::Gpt5Nano, 0.002),
            record(4, ProviderId::Gpt5Mini, 0.05),
        ];
        let summary = UsageSummary::from_records("2025-06-01", &records);

        assert_eq!(summary.requests_for(ProviderId::Gemini), 2);
        assert_eq!(summary.requests_for(ProviderId::Gpt5Nano), 1);
        assert_eq!(summary.cost_for(ProviderId::Gpt5Mini), 0.05);
        assert!((summary.total_cost - 0.052).abs() < 1e-12);
        assert_eq!(summary.total_requests(), 4);
    }
}
