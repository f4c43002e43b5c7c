//! Webhook Event Processing
//!
//! Verifies a signed payload, classifies the event type, and appends one
//! structured log line per event to a dated JSONL file. Unrecognized event
//! types are acknowledged and logged but marked ignored; a logging failure
//! never fails the response.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use super::signature::SignatureVerifier;
use crate::constants::webhook;
use crate::types::{CostwiseError, Result};

const COMMENT_PREVIEW_CHARS: usize = 100;

// =============================================================================
// Outcome
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    /// A supported event type was dispatched to internal processing
    Processed,
    /// The event type is not supported; acknowledged and logged only
    Ignored,
}

/// What the processor tells the transport layer to answer with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookOutcome {
    pub status: EventStatus,
    pub event: String,
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// Processor
// =============================================================================

pub struct WebhookProcessor {
    verifier: SignatureVerifier,
    log_dir: PathBuf,
}

impl WebhookProcessor {
    pub fn new(verifier: SignatureVerifier, log_dir: impl Into<PathBuf>) -> Self {
        Self {
            verifier,
            log_dir: log_dir.into(),
        }
    }

    /// Verify and process one delivery.
    ///
    /// `event_type` and `signature` come from the transport's headers;
    /// `body` is the raw, unparsed payload the signature was computed over.
    pub async fn handle(
        &self,
        event_type: &str,
        signature: Option<&str>,
        body: &[u8],
    ) -> Result<WebhookOutcome> {
        self.verifier.verify(signature, body)?;

        let payload: Value = serde_json::from_slice(body)
            .map_err(|e| CostwiseError::InvalidRequest(format!("invalid JSON payload: {e}")))?;

        let supported = webhook::SUPPORTED_EVENTS.contains(&event_type);
        let extracted = supported.then(|| extract_summary(event_type, &payload));
        let timestamp = Utc::now();

        // Every verified delivery is logged, recognized or not; a log
        // failure must not fail the response.
        self.append_log(&json!({
            "timestamp": timestamp,
            "event": event_type,
            "payload": payload,
            "extracted": extracted,
        }))
        .await;

        let status = if supported {
            info!(event = event_type, "Webhook event processed");
            EventStatus::Processed
        } else {
            info!(event = event_type, "Webhook event ignored (unsupported type)");
            EventStatus::Ignored
        };

        Ok(WebhookOutcome {
            status,
            event: event_type.to_string(),
            timestamp,
        })
    }

    /// One JSONL file per UTC date under the log directory.
    pub fn log_path_for(&self, date: chrono::NaiveDate) -> PathBuf {
        self.log_dir.join(format!("{}.jsonl", date.format("%Y-%m-%d")))
    }

    async fn append_log(&self, entry: &Value) {
        if let Err(e) = self.try_append_log(entry).await {
            warn!(error = %e, "webhook log write failed");
        }
    }

    async fn try_append_log(&self, entry: &Value) -> anyhow::Result<()> {
        use anyhow::Context;

        tokio::fs::create_dir_all(&self.log_dir)
            .await
            .with_context(|| format!("create log dir {}", self.log_dir.display()))?;

        let path = self.log_path_for(Utc::now().date_naive());
        let line = serde_json::to_string(entry).context("serialize webhook log entry")? + "\n";

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .with_context(|| format!("open {}", path.display()))?;
        file.write_all(line.as_bytes())
            .await
            .with_context(|| format!("append to {}", path.display()))?;
        file.flush()
            .await
            .with_context(|| format!("flush {}", path.display()))?;
        Ok(())
    }
}

// =============================================================================
// Event Summaries
// =============================================================================

/// Minimal per-event summary for internal processing, mirroring the fields
/// downstream consumers key on.
fn extract_summary(event_type: &str, payload: &Value) -> Value {
    match event_type {
        "push" => json!({
            "ref": payload.get("ref"),
            "repo": payload.pointer("/repository/full_name"),
            "pusher": payload.pointer("/pusher/name"),
            "commits": payload
                .get("commits")
                .and_then(Value::as_array)
                .map(|c| c.len())
                .unwrap_or(0),
        }),
        "pull_request" => json!({
            "action": payload.get("action"),
            "pr_number": payload.get("number"),
            "title": payload.pointer("/pull_request/title"),
            "state": payload.pointer("/pull_request/state"),
            "merged": payload.pointer("/pull_request/merged"),
        }),
        "issues" => json!({
            "action": payload.get("action"),
            "issue_number": payload.pointer("/issue/number"),
            "title": payload.pointer("/issue/title"),
        }),
        "issue_comment" => json!({
            "action": payload.get("action"),
            "issue_number": payload.pointer("/issue/number"),
            "comment_preview": payload
                .pointer("/comment/body")
                .and_then(Value::as_str)
                .map(|body| body.chars().take(COMMENT_PREVIEW_CHARS).collect::<String>()),
        }),
        _ => Value::Null,
    }
}

// =============================================================================
// Tests
// =============================================================================
