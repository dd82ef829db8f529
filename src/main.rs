//! Funding History Exporter - Main Entry Point
//!
//! Fetches all historical funding rates for one coin and writes them to CSV.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use funding_history_exporter::config::{Config, LoggingConfig};
use funding_history_exporter::exchange::HyperliquidClient;
use funding_history_exporter::export::{ExportSettings, FundingExporter};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

/// Funding History Exporter CLI
#[derive(Parser)]
#[command(name = "funding-history-exporter")]
#[command(version, about = "Export historical Hyperliquid funding rates to CSV")]
struct Cli {
    /// Coin to export (e.g. HYPE, BTC)
    #[arg(short, long)]
    coin: Option<String>,

    /// Output CSV path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Days per API request window
    #[arg(long)]
    chunk_days: Option<u32>,

    /// Start date (YYYY-MM-DD or Unix ms); skips earliest-data probing
    #[arg(short, long)]
    start: Option<String>,

    /// Append a timestamp to the generated filename
    #[arg(long)]
    timestamped: bool,

    /// Skip chunks that fail instead of aborting the run
    #[arg(long)]
    continue_on_error: bool,

    /// Hyperliquid API base URL
    #[arg(long)]
    base_url: Option<String>,
}

impl Cli {
    /// Apply command line overrides on top of the loaded configuration.
    fn apply(self, config: &mut Config) {
        if let Some(coin) = self.coin {
            config.export.coin = coin;
        }
        if let Some(output) = self.output {
            config.export.output = Some(output);
        }
        if let Some(chunk_days) = self.chunk_days {
            config.export.chunk_days = chunk_days;
        }
        if let Some(start) = self.start {
            config.export.start_time = Some(start);
        }
        if let Some(base_url) = self.base_url {
            config.api.base_url = base_url;
        }
        config.export.timestamped |= self.timestamped;
        config.export.continue_on_chunk_error |= self.continue_on_error;
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = Cli::parse();

    let config = match load_config(cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("Failed to initialize logging: {:#}", e);
        return ExitCode::FAILURE;
    }

    tokio::select! {
        result = run(&config) => match result {
            Ok(path) => {
                println!(
                    "\n✅ Successfully completed! Historical funding rates saved to: {}",
                    path.display()
                );
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("Error in main execution: {:#}", e);
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            info!("🛑 Operation cancelled by user");
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: Cli) -> Result<Config> {
    let mut config = Config::load()?;
    cli.apply(&mut config);
    config.validate()?;
    Ok(config)
}

/// Build the client and exporter, then run one export.
async fn run(config: &Config) -> Result<PathBuf> {
    log_config(config);

    let client = HyperliquidClient::new(&config.api)?;
    let settings = ExportSettings::from_config(&config.export, Utc::now())
        .context("Invalid export settings")?;
    let exporter = FundingExporter::new(client, settings);

    let summary = exporter.run().await?;
    Ok(summary.output_path)
}

/// Initialize logging to stdout, plus a daily rolling file when configured.
fn init_logging(logging: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::default()
            .add_directive(Level::INFO.into())
            .add_directive("funding_history_exporter=debug".parse()?),
    };

    let writer = match &logging.dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let file_appender = tracing_appender::rolling::daily(dir, "funding-history-exporter.log");
            let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

            // Leak the guard to keep it alive for the program duration
            Box::leak(Box::new(guard));

            BoxMakeWriter::new(std::io::stdout.and(file_writer))
        }
        None => BoxMakeWriter::new(std::io::stdout),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(true);

    let installed = if logging.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))
}

/// Log configuration on startup.
fn log_config(config: &Config) {
    info!("📋 Configuration:");
    info!("   API: {}", config.api.base_url);
    info!("   Coin: {}", config.export.coin);
    info!("   Chunk Size: {} days", config.export.chunk_days);
    info!(
        "   Retries: {} attempts, {}ms between requests",
        config.api.max_retries, config.api.rate_limit_delay_ms
    );
    if let Some(start) = &config.export.start_time {
        info!("   Forced Start: {}", start);
    }
    if config.export.continue_on_chunk_error {
        info!("   Failed chunks will be skipped");
    }
}
