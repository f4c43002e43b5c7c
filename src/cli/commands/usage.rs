//! Recent usage records, newest first.

use console::style;

use crate::config::ConfigLoader;
use crate::ledger::UsageLedger;
use crate::types::Result;

pub async fn run(limit: usize) -> Result<()> {
    let config = ConfigLoader::load()?;
    let ledger = UsageLedger::jsonl(&config.ledger.log_dir);

    let records = ledger.recent_usage(limit).await?;
    if records.is_empty() {
        println!("No usage recorded yet.");
        return Ok(());
    }

    for record in &records {
        let issue = record
            .issue_number
            .map(|n| format!(" #{n}"))
            .unwrap_or_default();
        println!(
            "{}  {:<11} {:>6} in {:>6} out  ${:<9.6} {}{}",
            style(record.timestamp.format("%Y-%m-%d %H:%M:%S")).dim(),
            record.provider.to_string(),
            record.tokens_input,
            record.tokens_output,
            record.cost,
            record.operation,
            style(issue).dim(),
        );
    }

    Ok(())
}
