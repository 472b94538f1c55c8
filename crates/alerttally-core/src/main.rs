//! alerttally CLI
//!
//! Fetches alerts for the lookback range and prints monthly per-manager
//! alert and event counts.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use alerttally::aggregator::{Aggregator, MonthlyReport, RunSettings};
use alerttally::config::{CursorPolicy, Overrides, PaginationMode};
use alerttally::fetcher::HttpAlertSource;
use alerttally::models::lookback_start;
use alerttally::Config;
use chrono::Utc;
use clap::Parser;
use tracing::info;

/// alerttally - monthly alert and event counts per manager
#[derive(Parser)]
#[command(name = "alerttally")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path (toml, yaml or json)
    #[arg(short, long, env = "ALERTTALLY_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging; raw API responses are only logged at this level
    /// unless --dump-responses is set
    #[arg(short, long)]
    verbose: bool,

    /// Log every raw API response at info level
    #[arg(long)]
    dump_responses: bool,

    /// Output format of the report
    #[arg(long, default_value = "text")]
    format: OutputFormat,

    /// Days subtracted from the first day of the current month
    #[arg(long)]
    lookback_days: Option<u32>,

    /// Width of each query window in hours
    #[arg(long)]
    window_hours: Option<u32>,

    /// Pause after every request (e.g. "500ms", "1s")
    #[arg(long, value_parser = humantime::parse_duration)]
    delay: Option<Duration>,

    /// Pages requested per window
    #[arg(long, value_enum)]
    pagination: Option<PaginationMode>,

    /// Cursor handling across windows
    #[arg(long, value_enum)]
    cursor: Option<CursorPolicy>,

    /// One page per window and carry the cursor across windows
    #[arg(long, conflicts_with_all = ["pagination", "cursor"])]
    legacy: bool,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config, cli.verbose);

    match run_report(config, cli.format).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(config: &Config, verbose: bool) {
    let log_level = if verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if config.logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            lookback_days: self.lookback_days,
            width_hours: self.window_hours,
            delay: self.delay,
            pagination: self.pagination,
            cursor: self.cursor,
            legacy: self.legacy,
            dump_responses: self.dump_responses,
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = Config::load(cli.config.as_deref())?;
    cli.overrides().apply(&mut config);
    config.validate()?;
    Ok(config)
}

async fn run_report(config: Config, format: OutputFormat) -> anyhow::Result<()> {
    let source = HttpAlertSource::new(&config.api)?;
    info!(url = %source.url(), "Using alert search endpoint");

    let now = Utc::now();
    let start = lookback_start(now, config.window.lookback_days)?;
    let aggregator = Aggregator::new(source, RunSettings::from(&config.window));

    let (tally, stats) = aggregator.run(start, now).await?;
    info!(
        windows = stats.windows,
        pages = stats.pages,
        alerts = stats.alerts,
        "Building report"
    );

    let report = MonthlyReport::from_tally(&tally);
    match format {
        OutputFormat::Text => print!("{report}"),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(())
}
