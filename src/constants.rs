//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Free-tier quota constants
pub mod quota {
    /// Free-tier requests allowed per rolling window
    pub const DAILY_FREE_LIMIT: u32 = 1500;

    /// Rolling quota window, relative to the last reset (not midnight-aligned)
    pub const WINDOW_HOURS: i64 = 24;

    /// Warn when fewer than this many free-tier requests remain today
    pub const WARN_REMAINING: i64 = 300;
}

/// Published price tables (USD per million tokens)
pub mod pricing {
    /// GPT-5 nano input price
    pub const NANO_INPUT_PER_M: f64 = 0.05;

    /// GPT-5 nano output price
    pub const NANO_OUTPUT_PER_M: f64 = 0.40;

    /// GPT-5 mini input price
    pub const MINI_INPUT_PER_M: f64 = 0.25;

    /// GPT-5 mini output price
    pub const MINI_OUTPUT_PER_M: f64 = 2.00;
}

/// Token estimation constants
pub mod estimate {
    /// Characters per token for providers that do not report usage counts
    pub const CHARS_PER_TOKEN: usize = 4;
}

/// Usage ledger constants
pub mod ledger {
    /// Default directory for the usage log and snapshot files
    pub const DEFAULT_LOG_DIR: &str = ".cost-logs";

    /// Append-only record stream, one JSON object per line
    pub const USAGE_LOG_FILE: &str = "usage.jsonl";

    /// Periodic snapshot of daily summaries, keyed by date string
    pub const SNAPSHOT_FILE: &str = "daily-summary.json";

    /// Default number of records returned by recent-usage queries
    pub const DEFAULT_RECENT_LIMIT: usize = 100;
}

/// Cost report constants
pub mod report {
    /// Default trailing window for cost reports (days)
    pub const DEFAULT_WINDOW_DAYS: i64 = 7;
}

/// HTTP/Network constants
pub mod network {
    /// Default request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
}

/// Webhook collaborator constants
pub mod webhook {
    /// Directory for dated webhook event logs
    pub const DEFAULT_LOG_DIR: &str = ".webhook-logs";

    /// Signature header scheme prefix
    pub const SIGNATURE_PREFIX: &str = "sha256=";

    /// Event types dispatched to internal processing; anything else is
    /// acknowledged but marked ignored
    pub const SUPPORTED_EVENTS: [&str; 4] = ["push", "pull_request", "issues", "issue_comment"];
}
