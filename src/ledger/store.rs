//! Durable Sequential Record Stores
//!
//! The `UsageStore` trait abstracts the ledger's append-only persistence so
//! tests can substitute an in-memory store without touching a filesystem.
//! The production store writes newline-delimited JSON, one record per line;
//! every append is a single write of a complete line, so concurrent writers
//! never interleave partial records.

use anyhow::Context;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};
use tracing::warn;

use super::record::UsageRecord;
use crate::types::{CostwiseError, Result};

// =============================================================================
// Store Trait
// =============================================================================

/// Append-only record storage.
#[async_trait]
pub trait UsageStore: Send + Sync {
    /// Append one record. Each record is serialized independently.
    async fn append(&self, record: &UsageRecord) -> Result<()>;

    /// Load every record in original append order (oldest first).
    async fn load(&self) -> Result<Vec<UsageRecord>>;
}

// =============================================================================
// JSONL Store
// =============================================================================

/// Newline-delimited JSON file store.
///
/// The file handle is opened lazily and cached for the process lifetime;
/// appends are serialized behind an async mutex.
pub struct JsonlStore {
    path: PathBuf,
    file: Mutex<Option<tokio::fs::File>>,
}

impl JsonlStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn try_append(&self, record: &UsageRecord) -> anyhow::Result<()> {
        let line = serde_json::to_string(record).context("serialize usage record")? + "\n";

        let mut guard = self.file.lock().await;
        if guard.is_none() {
            if let Some(parent) = self.path.parent()
                && !parent.as_os_str().is_empty()
            {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("create log dir {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await
                .with_context(|| format!("open {}", self.path.display()))?;
            *guard = Some(file);
        }

        guard
            .as_mut()
            .expect("file handle opened above")
            .write_all(line.as_bytes())
            .await
            .with_context(|| format!("append to {}", self.path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl UsageStore for JsonlStore {
    async fn append(&self, record: &UsageRecord) -> Result<()> {
        self.try_append(record)
            .await
            .map_err(|e| CostwiseError::LedgerWrite(format!("{e:#}")))
    }

    async fn load(&self) -> Result<Vec<UsageRecord>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for line in content.lines().filter(|line| !line.trim().is_empty()) {
            match serde_json::from_str::<UsageRecord>(line) {
                Ok(record) => records.push(record),
                // A torn trailing line from an interrupted write must not
                // poison the whole stream.
                Err(e) => warn!(error = %e, "skipping unparsable usage record"),
            }
        }
        Ok(records)
    }
}

// =============================================================================
// In-Memory Store
// =============================================================================

/// Volatile store for tests and dashboard previews.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Vec<UsageRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UsageStore for MemoryStore {
    async fn append(&self, record: &UsageRecord) -> Result<()> {
        self.records.write().await.push(record.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Vec<UsageRecord>> {
        Ok(self.records.read().await.clone())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProviderId;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn record(minute: u32) -> UsageRecord {
        UsageRecord {
            timestamp: Utc.with_ymd_and_hms(2025, 6, 1, 10, minute, 0).unwrap(),
            provider: ProviderId::Gemini,
            tokens_input: 10,
            tokens_output: 5,
            cost: 0.0,
            operation: "test".to_string(),
            issue_number: None,
        }
    }

    #[tokio::test]
    async fn test_jsonl_roundtrip_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlStore::new(dir.path().join("usage.jsonl"));

        for minute in 0..5 {
            store.append(&record(minute)).await.unwrap();
        }

        let records = store.load().await.unwrap();
        assert_eq!(records.len(), 5);
        assert!(records.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[tokio::test]
    async fn test_jsonl_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlStore::new(dir.path().join("absent.jsonl"));
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_jsonl_skips_torn_trailing_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("usage.jsonl");
        let store = JsonlStore::new(&path);
        store.append(&record(0)).await.unwrap();

        // Simulate a write interrupted mid-record
        let mut content = tokio::fs::read_to_string(&path).await.unwrap();
        content.push_str("{\"timestamp\":\"2025-06-01T");
        tokio::fs::write(&path, content).await.unwrap();

        let records = JsonlStore::new(&path).load().await.unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn test_jsonl_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlStore::new(dir.path().join("nested/logs/usage.jsonl"));
        store.append(&record(0)).await.unwrap();
        assert_eq!(store.load().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_appends_never_tear_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonlStore::new(dir.path().join("usage.jsonl")));

        let mut handles = Vec::new();
        for task in 0..8u32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                for minute in 0..10 {
                    store.append(&record(task + minute)).await.unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // Every line parses: no interleaved partial records
        assert_eq!(store.load().await.unwrap().len(), 80);
    }

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        store.append(&record(1)).await.unwrap();
        store.append(&record(2)).await.unwrap();
        assert_eq!(store.load().await.unwrap().len(), 2);
    }
}
