//! trendctl - Trend reports for the fiber rollout dashboard
//!
//! Loads an event feed (file or HTTP) and prints period trends, daily-rate
//! comparisons and national rollups.

mod commands;
mod output;
mod source;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use common::logging::{self, LogConfig};
use rollout_trends::Clock;
use tracing::debug;

use crate::commands::{Commands, Context};
use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "trendctl")]
#[command(about = "Rollout trend reports")]
#[command(long_about = "Rollout trend reports

Commands:
  period      Resolve a period token to its start and end
  trend       Trend of a metric, optionally per entity and period
  compare     Daily-rate comparison with the previous week or month
  aggregate   National rollup across entities
  report      Report for all configured metrics (--watch to refresh)

Examples:
  trendctl period current-week
  trendctl --events data/events.json trend -m hotoGPsDone -e Bihar -p current-month
  trendctl --events https://dash.example/api/events compare -m surveyKm
  trendctl report --watch --format json

Periods: today, current-week, last-week, current-month, last-month.
Weeks start on Sunday.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Event feed: file path or http(s) URL (overrides feed.source)
    #[arg(long, global = true)]
    events: Option<String>,

    /// Configuration file (toml, yaml or json)
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Freeze the clock: RFC3339 instant or YYYY-MM-DD (local noon)
    #[arg(long, global = true)]
    now: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let config = common::load_config(cli.config.as_deref())?;

    let mut log_config = LogConfig::from_settings("trendctl", &config.logging);
    if cli.verbose {
        log_config.level = "debug".to_string();
    }
    log_config.ansi = !cli.no_color;
    logging::init_with_config(log_config)?;

    let clock = commands::build_clock(cli.now.as_deref(), &config.utc_offset)?;
    debug!(now = %clock.now(), offset = %config.utc_offset, "Clock ready");

    let ctx = Context {
        config,
        clock,
        format: cli.format,
        events: cli.events,
    };
    commands::run(&ctx, cli.command).await
}
