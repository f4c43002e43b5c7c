//! Free-tier limit status.

use console::style;
use std::sync::Arc;

use crate::config::ConfigLoader;
use crate::ledger::UsageLedger;
use crate::report::CostReporter;
use crate::types::Result;

pub async fn run() -> Result<()> {
    let config = ConfigLoader::load()?;
    let ledger = Arc::new(UsageLedger::jsonl(&config.ledger.log_dir));
    let reporter = CostReporter::new(ledger);

    let status = reporter.limit_status().await?;
    if status.warning {
        println!("{}", style(&status.message).yellow().bold());
    } else {
        println!("{}", status.message);
    }

    Ok(())
}
