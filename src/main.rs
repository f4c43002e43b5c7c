use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use costwise::cli::commands;
use costwise::constants::{ledger, report};

#[derive(Parser)]
#[command(name = "costwise")]
#[command(
    version,
    about = "Cost-minimizing AI gateway with fallback routing and usage accounting"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long)]
    verbose: bool,

    #[arg(long, short)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a completion through the provider fallback chain
    Ask {
        #[arg(help = "Prompt text")]
        prompt: String,
        #[arg(long, short, help = "System instruction")]
        system: Option<String>,
        #[arg(
            long,
            short,
            default_value = "cli",
            help = "Operation tag recorded in the usage ledger"
        )]
        operation: String,
        #[arg(long, help = "Issue number to correlate the record with")]
        issue: Option<u64>,
    },

    /// Render a cost report over a trailing window
    Report {
        #[arg(long, short, default_value_t = report::DEFAULT_WINDOW_DAYS, help = "Window length in days")]
        days: i64,
    },

    /// Show free-tier limit status for today
    Status,

    /// List recent usage records, newest first
    Usage {
        #[arg(long, short, default_value_t = ledger::DEFAULT_RECENT_LIMIT, help = "Maximum records to show")]
        limit: usize,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(long, help = "Output as JSON instead of TOML")]
        json: bool,
    },
    /// Show configuration file paths
    Path,
    /// Initialize configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

fn main() -> ExitCode {
    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {e}");
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Ask {
            prompt,
            system,
            operation,
            issue,
        } => {
            let rt = Runtime::new()?;
            rt.block_on(commands::ask::run(commands::ask::AskOptions {
                prompt,
                system,
                operation,
                issue,
            }))?;
        }
        Commands::Report { days } => {
            let rt = Runtime::new()?;
            rt.block_on(commands::report::run(days))?;
        }
        Commands::Status => {
            let rt = Runtime::new()?;
            rt.block_on(commands::status::run())?;
        }
        Commands::Usage { limit } => {
            let rt = Runtime::new()?;
            rt.block_on(commands::usage::run(limit))?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { json } => commands::config::show(json)?,
            ConfigAction::Path => commands::config::path()?,
            ConfigAction::Init { global, force } => commands::config::init(global, force)?,
        },
    }

    Ok(())
}
