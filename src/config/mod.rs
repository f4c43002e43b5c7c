//! Configuration
//!
//! Layered configuration: built-in defaults, global and project TOML files,
//! and `COSTWISE_*` environment variables, merged with Figment.

pub mod loader;
pub mod types;

pub use loader::ConfigLoader;
pub use types::{
    Config, GeminiConfig, GenerationConfig, LedgerConfig, OpenAiConfig, ProvidersConfig,
    WebhookConfig,
};
