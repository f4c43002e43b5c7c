//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//!
//! ## Error Taxonomy
//!
//! - **Config**: no provider credentials or invalid settings. Fatal, raised
//!   at construction, never retried.
//! - **Provider**: a single backend call failed. Recovered internally by
//!   falling through to the next tier.
//! - **Exhausted**: every configured tier failed for one request. The
//!   terminal failure of `generate`.
//! - **LedgerWrite**: recording usage failed. Always caught and swallowed at
//!   the ledger boundary, never allowed to fail the response path.
//! - **Signature**: webhook payload failed HMAC verification.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CostwiseError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A single provider call failed. Only surfaced to callers when it
    /// occurred at the last configured tier; otherwise observable through
    /// logs alone.
    #[error("Provider '{provider}' failed: {message}")]
    Provider { provider: String, message: String },

    /// Every configured tier was attempted (or skipped for quota) and none
    /// succeeded.
    #[error("All AI providers failed after {attempts} attempt(s): {last}")]
    Exhausted { attempts: usize, last: String },

    #[error("Ledger write failed: {0}")]
    LedgerWrite(String),

    #[error("Signature verification failed: {0}")]
    Signature(String),
}

impl CostwiseError {
    /// Create a provider error with context
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Check whether this error terminates a whole `generate` call, as
    /// opposed to a single tier within it.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Exhausted { .. } | Self::Config(_))
    }
}

pub type Result<T> = std::result::Result<T, CostwiseError>;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_display() {
        let err = CostwiseError::provider("gemini", "connection reset");
        assert_eq!(
            err.to_string(),
            "Provider 'gemini' failed: connection reset"
        );
    }

    #[test]
    fn test_exhausted_is_terminal() {
        let err = CostwiseError::Exhausted {
            attempts: 3,
            last: "timeout".to_string(),
        };
        assert!(err.is_terminal());
        assert!(CostwiseError::Config("no keys".to_string()).is_terminal());
        assert!(!CostwiseError::provider("openai", "429").is_terminal());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: CostwiseError = io.into();
        assert!(matches!(err, CostwiseError::Io(_)));
    }
}
