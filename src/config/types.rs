//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/costwise/) and project (.costwise/) level
//! configuration.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::{ledger, network, webhook};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Provider credentials and model names
    pub providers: ProvidersConfig,

    /// Generation defaults
    pub generation: GenerationConfig,

    /// Usage ledger settings
    pub ledger: LedgerConfig,

    /// Webhook collaborator settings
    pub webhook: WebhookConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            providers: ProvidersConfig::default(),
            generation: GenerationConfig::default(),
            ledger: LedgerConfig::default(),
            webhook: WebhookConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `CostwiseError::Config` on validation failure.
    pub fn validate(&self) -> crate::types::Result<()> {
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(crate::types::CostwiseError::Config(format!(
                "generation temperature must be between 0.0 and 2.0, got {}",
                self.generation.temperature
            )));
        }

        if self.generation.timeout_secs == 0 {
            return Err(crate::types::CostwiseError::Config(
                "generation timeout_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

// =============================================================================
// Provider Configuration
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub gemini: GeminiConfig,
    pub openai: OpenAiConfig,
}

/// Free-tier backend settings.
///
/// The API key is never serialized back out; prefer the `GEMINI_API_KEY`
/// environment variable over putting keys in config files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub enabled: bool,
    pub model: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: "gemini-1.5-flash".to_string(),
            api_key: None,
        }
    }
}

impl GeminiConfig {
    /// Config value first, `GEMINI_API_KEY` env var second.
    pub fn resolve_key(&self) -> Option<SecretString> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .filter(|key| !key.is_empty())
            .map(SecretString::from)
    }
}

/// Paid-tier backend settings. One key serves both paid tiers; the model
/// names distinguish them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub enabled: bool,
    pub nano_model: String,
    pub mini_model: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            nano_model: "gpt-5-nano".to_string(),
            mini_model: "gpt-5-mini".to_string(),
            api_key: None,
        }
    }
}

impl OpenAiConfig {
    /// Config value first, `OPENAI_API_KEY` env var second.
    pub fn resolve_key(&self) -> Option<SecretString> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|key| !key.is_empty())
            .map(SecretString::from)
    }
}

// =============================================================================
// Generation Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Sampling temperature passed to paid providers when no per-call
    /// override is given
    pub temperature: f32,
    /// Default cap on generated tokens (provider default when absent)
    pub max_tokens: Option<u32>,
    /// HTTP timeout per provider call
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: None,
            timeout_secs: network::DEFAULT_TIMEOUT_SECS,
        }
    }
}

// =============================================================================
// Ledger Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Directory holding the usage log and the daily-summary snapshot
    pub log_dir: PathBuf,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from(ledger::DEFAULT_LOG_DIR),
        }
    }
}

// =============================================================================
// Webhook Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Shared HMAC secret; prefer the `WEBHOOK_SECRET` environment variable
    #[serde(skip_serializing)]
    pub secret: Option<String>,
    /// Directory for dated webhook event logs
    pub log_dir: PathBuf,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            secret: None,
            log_dir: PathBuf::from(webhook::DEFAULT_LOG_DIR),
        }
    }
}

impl WebhookConfig {
    pub fn resolve_secret(&self) -> Option<SecretString> {
        self.secret
            .clone()
            .or_else(|| std::env::var("WEBHOOK_SECRET").ok())
            .filter(|secret| !secret.is_empty())
            .map(SecretString::from)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(config.providers.gemini.enabled);
        assert_eq!(config.providers.openai.nano_model, "gpt-5-nano");
    }

    #[test]
    fn test_temperature_out_of_range_rejected() {
        let mut config = Config::default();
        config.generation.temperature = 3.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = Config::default();
        config.generation.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_api_keys_never_serialized() {
        let mut config = Config::default();
        config.providers.gemini.api_key = Some("secret-key".to_string());
        config.webhook.secret = Some("hook-secret".to_string());

        let toml = toml::to_string(&config).unwrap();
        assert!(!toml.contains("secret-key"));
        assert!(!toml.contains("hook-secret"));
    }

    #[test]
    fn test_config_key_takes_precedence_over_env() {
        let config = GeminiConfig {
            api_key: Some("from-config".to_string()),
            ..Default::default()
        };
        assert!(config.resolve_key().is_some());
    }

    #[test]
    fn test_empty_config_key_ignored() {
        let config = GeminiConfig {
            api_key: Some(String::new()),
            ..Default::default()
        };
        // Empty strings resolve to None (falls back to env, absent in tests)
        if std::env::var("GEMINI_API_KEY").is_err() {
            assert!(config.resolve_key().is_none());
        }
    }
}
