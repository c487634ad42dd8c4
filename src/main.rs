#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

use price_scout_lib::infrastructure::logging::{init_logging_with_config, log_system_info};
use price_scout_lib::infrastructure::{AppConfig, ConfigManager, ExecutionMode};
use price_scout_lib::{RunOutcome, SearchRun};

const EXIT_STOPPED: u8 = 2;

/// Harvest a product search into a JSON report
#[derive(Debug, Parser)]
#[command(name = "price-scout", version, about)]
struct Cli {
    /// Configuration file (defaults to the per-user config file)
    #[arg(long, env = "PRICE_SCOUT_CONFIG")]
    config: Option<PathBuf>,

    /// Search term, also the report title and file name
    #[arg(long)]
    term: Option<String>,

    /// Lower price bound in whole currency units
    #[arg(long)]
    min: Option<u32>,

    /// Upper price bound in whole currency units
    #[arg(long)]
    max: Option<u32>,

    /// Currency code recorded in the report
    #[arg(long)]
    currency: Option<String>,

    /// Directory the report is written to
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// sequential or concurrent
    #[arg(long)]
    mode: Option<ExecutionMode>,

    /// Number of HTTP sessions, bounding parallel detail fetches
    #[arg(long)]
    concurrency: Option<usize>,

    /// error, warn, info, debug or trace
    #[arg(long)]
    log_level: Option<String>,

    /// Write the default configuration file and exit
    #[arg(long)]
    init_config: bool,
}

impl Cli {
    fn apply(self, mut config: AppConfig) -> AppConfig {
        if let Some(term) = self.term {
            config.search.term = term;
        }
        if let Some(min) = self.min {
            config.search.price_min = min;
        }
        if let Some(max) = self.max {
            config.search.price_max = max;
        }
        if let Some(currency) = self.currency {
            config.search.currency = currency;
        }
        if let Some(dir) = self.output_dir {
            config.output.directory = dir;
        }
        if let Some(mode) = self.mode {
            config.pipeline.mode = mode;
        }
        if let Some(concurrency) = self.concurrency {
            config.pipeline.max_concurrent = concurrency;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        config
    }
}

fn config_manager(path: Option<&PathBuf>) -> Result<ConfigManager> {
    match path {
        Some(path) => Ok(ConfigManager::with_path(path)),
        None => ConfigManager::new(),
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let manager = config_manager(cli.config.as_ref())?;

    if cli.init_config {
        manager.write_default().await?;
        eprintln!("Wrote default configuration to {}", manager.config_path().display());
        return Ok(ExitCode::SUCCESS);
    }

    let config = cli.apply(manager.load_config()?);
    init_logging_with_config(&config.logging).context("Failed to initialize logging")?;
    log_system_info();
    info!("{}", manager.describe_source());

    let search = SearchRun::new(config)?;
    info!(
        "Searching '{}' between {} and {} {}",
        search.config().search.term,
        search.config().search.price_min,
        search.config().search.price_max,
        search.config().search.currency
    );

    match search.execute().await? {
        RunOutcome::ReportWritten {
            path,
            product_count,
        } => {
            info!("🎉 Report with {} products: {}", product_count, path.display());
            Ok(ExitCode::SUCCESS)
        }
        RunOutcome::NoListings => {
            info!("Stopped without a report");
            Ok(ExitCode::from(EXIT_STOPPED))
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("price-scout: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
