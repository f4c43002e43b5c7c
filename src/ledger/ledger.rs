//! The Usage Ledger
//!
//! Append-only accounting of every completed generation call. Recording
//! never fails the caller's main flow: a storage failure is logged and
//! swallowed so accounting can never break the primary generation path.
//!
//! Queries read the full record stream on demand; the stream, not any
//! snapshot, is authoritative.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

use super::record::{UsageRecord, UsageSummary};
use super::store::{JsonlStore, MemoryStore, UsageStore};
use crate::constants::ledger as ledger_constants;
use crate::types::{CostwiseError, ProviderId, Result, TokenCounts};

// =============================================================================
// Usage Event
// =============================================================================

/// A completed call as reported by the gateway; the ledger stamps the
/// timestamp at append time.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageEvent {
    pub provider: ProviderId,
    pub tokens: TokenCounts,
    pub cost: f64,
    pub operation: String,
    pub issue_number: Option<u64>,
}

impl UsageEvent {
    fn into_record(self, timestamp: DateTime<Utc>) -> UsageRecord {
        UsageRecord {
            timestamp,
            provider: self.provider,
            tokens_input: self.tokens.input,
            tokens_output: self.tokens.output,
            cost: self.cost,
            operation: self.operation,
            issue_number: self.issue_number,
        }
    }
}

// =============================================================================
// Usage Ledger
// =============================================================================

pub struct UsageLedger {
    store: Arc<dyn UsageStore>,
    snapshot_path: Option<PathBuf>,
}

impl UsageLedger {
    pub fn new(store: Arc<dyn UsageStore>) -> Self {
        Self {
            store,
            snapshot_path: None,
        }
    }

    /// Production ledger: JSONL record stream plus a daily-summary snapshot
    /// file, both under `log_dir`.
    pub fn jsonl(log_dir: impl Into<PathBuf>) -> Self {
        let dir = log_dir.into();
        Self {
            store: Arc::new(JsonlStore::new(dir.join(ledger_constants::USAGE_LOG_FILE))),
            snapshot_path: Some(dir.join(ledger_constants::SNAPSHOT_FILE)),
        }
    }

    /// Volatile ledger for tests and previews.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn with_snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    // =========================================================================
    // Writing
    // =========================================================================

    /// Append a timestamped record. Failures are reported in logs and
    /// swallowed; this method never breaks the caller's flow.
    pub async fn record(&self, event: UsageEvent) {
        self.record_at(event, Utc::now()).await;
    }

    /// Append with an explicit timestamp. Tests use this to pin the clock.
    pub async fn record_at(&self, event: UsageEvent, timestamp: DateTime<Utc>) {
        let record = event.into_record(timestamp);
        if let Err(e) = self.store.append(&record).await {
            warn!(error = %e, "usage record dropped");
        }
    }

    // =========================================================================
    // Reading
    // =========================================================================

    /// Records in append order, optionally bounded by inclusive timestamps.
    pub async fn query(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<UsageRecord>> {
        let records = self.store.load().await?;
        Ok(records
            .into_iter()
            .filter(|r| r.in_range(start, end))
            .collect())
    }

    /// The most recently appended records, newest first.
    pub async fn recent_usage(&self, limit: usize) -> Result<Vec<UsageRecord>> {
        let mut records = self.store.load().await?;
        records.reverse();
        records.truncate(limit);
        Ok(records)
    }

    /// Aggregate one UTC calendar day: 00:00:00 through 23:59:59.
    pub async fn daily_summary(&self, date: NaiveDate) -> Result<UsageSummary> {
        let start = date.and_hms_opt(0, 0, 0).expect("valid midnight").and_utc();
        let end = date
            .and_hms_opt(23, 59, 59)
            .expect("valid end of day")
            .and_utc();
        let records = self.query(Some(start), Some(end)).await?;
        Ok(UsageSummary::from_records(
            date.format("%Y-%m-%d").to_string(),
            &records,
        ))
    }

    /// Aggregate one UTC calendar month.
    pub async fn monthly_summary(&self, year: i32, month: u32) -> Result<UsageSummary> {
        let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
            CostwiseError::InvalidRequest(format!("invalid month: {year}-{month:02}"))
        })?;
        let next_month = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }
        .expect("valid first of month");
        let last = next_month - Duration::days(1);

        let start = first.and_hms_opt(0, 0, 0).expect("valid midnight").and_utc();
        let end = last
            .and_hms_opt(23, 59, 59)
            .expect("valid end of day")
            .and_utc();
        let records = self.query(Some(start), Some(end)).await?;
        Ok(UsageSummary::from_records(
            format!("{year}-{month:02}"),
            &records,
        ))
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    /// Write today's summary into the snapshot file, replacing an existing
    /// entry for the same date. The record stream remains authoritative; the
    /// snapshot is a cache for dashboard consumers.
    pub async fn save_daily_snapshot(&self) -> Result<()> {
        let Some(path) = &self.snapshot_path else {
            return Err(CostwiseError::LedgerWrite(
                "no snapshot path configured".to_string(),
            ));
        };

        let today = self.daily_summary(Utc::now().date_naive()).await?;
        let mut summaries = self.load_snapshots().await?;
        match summaries.iter_mut().find(|s| s.date == today.date) {
            Some(existing) => *existing = today,
            None => summaries.push(today),
        }

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(&summaries)?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// All saved daily summaries; empty when no snapshot exists yet.
    pub async fn load_snapshots(&self) -> Result<Vec<UsageSummary>> {
        let Some(path) = &self.snapshot_path else {
            return Ok(Vec::new());
        };
        match tokio::fs::read_to_string(path).await {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
