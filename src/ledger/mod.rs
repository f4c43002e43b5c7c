//! Usage Accounting
//!
//! Append-only ledger of completed generation calls with on-demand
//! aggregation.
//!
//! ## Modules
//!
//! - `record`: Record and summary value types
//! - `store`: Durable sequential writer seam (JSONL file or in-memory)
//! - `ledger`: The ledger proper (record, query, summaries, snapshots)

pub mod ledger;
pub mod record;
pub mod store;

pub use ledger::{UsageEvent, UsageLedger};
pub use record::{UsageRecord, UsageSummary};
pub use store::{JsonlStore, MemoryStore, UsageStore};
