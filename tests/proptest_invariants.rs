//! Property-based tests for the pure accounting invariants:
//! quota window behavior, price-table purity, token estimation bounds, and
//! summary aggregation.
//!
//! Run with: cargo test --test proptest_invariants

use chrono::{Duration, TimeZone, Utc};
use costwise::ledger::{UsageRecord, UsageSummary};
use costwise::provider::{PriceTable, estimate_tokens, quota::QuotaState};
use costwise::types::ProviderId;
use proptest::prelude::*;

fn base_time() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
}

fn provider_for(index: u8) -> ProviderId {
    ProviderId::ALL[index as usize % ProviderId::ALL.len()]
}

proptest! {
    /// Within a window, rolling never resets the counter; only elapsing the
    /// full window does, and then exactly once.
    #[test]
    fn quota_resets_only_after_window_elapses(
        offsets in proptest::collection::vec(0i64..86_400, 1..50),
        used in 1u32..2000,
    ) {
        let window = Duration::hours(24);
        let start = base_time();
        let mut state = QuotaState::new(start);
        state.used = used;

        // Offsets within the window (24h = 86_400s, strictly-greater reset)
        for offset in &offsets {
            state.roll(start + Duration::seconds(*offset), window);
            prop_assert_eq!(state.used, used, "reset before the window elapsed");
            prop_assert_eq!(state.window_start, start);
        }

        // One check past the window resets exactly once
        let later = start + window + Duration::seconds(1);
        state.roll(later, window);
        prop_assert_eq!(state.used, 0);
        prop_assert_eq!(state.window_start, later);
    }

    /// Cost is a pure, additive, non-negative function of the token counts.
    #[test]
    fn paid_cost_is_pure_and_additive(
        input_a in 0u32..1_000_000,
        output_a in 0u32..1_000_000,
        input_b in 0u32..1_000_000,
        output_b in 0u32..1_000_000,
    ) {
        for table in [PriceTable::GPT5_NANO, PriceTable::GPT5_MINI] {
            let a = table.cost(input_a, output_a);
            let b = table.cost(input_b, output_b);
            let combined = table.cost(input_a + input_b, output_a + output_b);

            prop_assert!(a >= 0.0);
            prop_assert_eq!(table.cost(input_a, output_a), a, "same inputs, same cost");
            prop_assert!((combined - (a + b)).abs() < 1e-9);
        }
        prop_assert_eq!(PriceTable::FREE.cost(input_a, output_a), 0.0);
    }

    /// ceil(chars / 4): the estimate covers the text and never overshoots by
    /// a full token.
    #[test]
    fn token_estimate_brackets_char_count(text in ".{0,400}") {
        let chars = text.chars().count();
        let estimate = estimate_tokens(&text) as usize;

        prop_assert!(estimate * 4 >= chars);
        if chars > 0 {
            prop_assert!((estimate - 1) * 4 < chars);
        } else {
            prop_assert_eq!(estimate, 0);
        }
    }

    /// Splitting a record stream at any point and summing the two summaries
    /// equals summarizing the whole stream: no double counting, no omission.
    #[test]
    fn summary_aggregation_partitions(
        entries in proptest::collection::vec((0u8..3, 0u32..10_000, 0u32..10_000), 0..60),
        split in 0usize..60,
    ) {
        let records: Vec<UsageRecord> = entries
            .iter()
            .enumerate()
            .map(|(minute, (provider, input, output))| {
                let provider = provider_for(*provider);
                let table = match provider {
                    ProviderId::Gemini => PriceTable::FREE,
                    ProviderId::Gpt5Nano => PriceTable::GPT5_NANO,
                    ProviderId::Gpt5Mini => PriceTable::GPT5_MINI,
                };
                UsageRecord {
                    timestamp: base_time() + Duration::seconds(minute as i64),
                    provider,
                    tokens_input: *input,
                    tokens_output: *output,
                    cost: table.cost(*input, *output),
                    operation: "prop".to_string(),
                    issue_number: None,
                }
            })
            .collect();

        let split = split.min(records.len());
        let whole = UsageSummary::from_records("all", &records);
        let left = UsageSummary::from_records("left", &records[..split]);
        let right = UsageSummary::from_records("right", &records[split..]);

        prop_assert_eq!(
            whole.total_requests(),
            left.total_requests() + right.total_requests()
        );
        prop_assert!((whole.total_cost - (left.total_cost + right.total_cost)).abs() < 1e-9);
        for id in ProviderId::ALL {
            prop_assert_eq!(
                whole.requests_for(id),
                left.requests_for(id) + right.requests_for(id)
            );
            prop_assert!(
                (whole.cost_for(id) - (left.cost_for(id) + right.cost_for(id))).abs() < 1e-9
            );
        }
    }
}
