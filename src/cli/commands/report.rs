//! Trailing-window cost report.

use std::sync::Arc;

use crate::config::ConfigLoader;
use crate::ledger::UsageLedger;
use crate::report::CostReporter;
use crate::types::Result;

pub async fn run(days: i64) -> Result<()> {
    let config = ConfigLoader::load()?;
    let ledger = Arc::new(UsageLedger::jsonl(&config.ledger.log_dir));
    let reporter = CostReporter::new(Arc::clone(&ledger));

    let report = reporter.report(days).await?;
    println!("{report}");

    // Refresh the dashboard snapshot while we are here; the record stream
    // stays authoritative either way.
    if let Err(e) = ledger.save_daily_snapshot().await {
        tracing::warn!(error = %e, "daily snapshot not updated");
    }

    Ok(())
}
