//! Subcommand handlers

use std::time::Duration;

use anyhow::Result;
use chrono::NaiveDateTime;
use clap::Subcommand;
use common::{config_loader::feed_token, shutdown::wait_for_shutdown, RolloutConfig};
use errors::{RolloutError, RolloutErrorTrait, RolloutResult};
use rollout_trends::{
    calculate_aggregate_comparative_trend, calculate_aggregate_period_trend,
    calculate_aggregate_trend, calculate_comparative_trend, calculate_period_trend,
    calculate_trend, distinct_entities, parse_local_instant, parse_utc_offset, resolve_period,
    Clock, ComparativeTrendResult, Event, FixedClock, Period, PeriodToken, ReportBuilder,
    SystemClock, TrendReport, TrendResult,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::output::{self, OutputFormat};
use crate::source::{EventSnapshot, EventSource, FeedLoader};

#[derive(Subcommand)]
pub enum Commands {
    /// Show the window a period token resolves to
    #[command(about = "Resolve a period token (today, current-week, last-month, ...)")]
    Period {
        /// Period token
        token: String,
    },

    /// Trend of one metric, optionally for one entity
    #[command(about = "Trend of a metric between two observations")]
    Trend {
        #[arg(short, long)]
        metric: String,
        #[arg(short, long)]
        entity: Option<String>,
        /// Restrict to a period; latest two observations when omitted
        #[arg(short, long)]
        period: Option<String>,
    },

    /// Daily-rate comparison against the previous comparable period
    #[command(about = "Compare daily progress with the previous week or month")]
    Compare {
        #[arg(short, long)]
        metric: String,
        #[arg(short, long)]
        entity: Option<String>,
        /// current-week or current-month (defaults to the configured period)
        #[arg(short, long)]
        period: Option<String>,
    },

    /// National rollup across entities
    #[command(about = "Sum a metric's trend across entities")]
    Aggregate {
        #[arg(short, long)]
        metric: String,
        /// Entities to include (repeatable); configured or all when omitted
        #[arg(short = 'e', long = "entity")]
        entities: Vec<String>,
        #[arg(short, long)]
        period: Option<String>,
    },

    /// Full report over the configured metrics and entities
    #[command(about = "Trend report for every metric and entity")]
    Report {
        #[arg(short, long)]
        period: Option<String>,
        /// Refetch and reprint every refresh interval until interrupted
        #[arg(short, long)]
        watch: bool,
    },
}

/// Everything a handler needs
pub struct Context {
    pub config: RolloutConfig,
    pub clock: Box<dyn Clock>,
    pub format: OutputFormat,
    /// `--events` override of `feed.source`
    pub events: Option<String>,
}

impl Context {
    fn loader(&self) -> RolloutResult<FeedLoader> {
        let raw = self
            .events
            .as_deref()
            .or(self.config.feed.source.as_deref())
            .ok_or_else(|| {
                RolloutError::MissingConfig("feed.source (or --events)".to_string())
            })?;
        let source = EventSource::parse(raw)?;
        let offset = parse_utc_offset(&self.config.utc_offset)?;
        let timeout = Duration::from_secs(self.config.feed.timeout_secs);
        Ok(FeedLoader::new(source, timeout, offset)?.with_token(feed_token()))
    }

    fn period_or_default(&self, period: Option<String>) -> String {
        period.unwrap_or_else(|| self.config.default_period.clone())
    }
}

/// Frozen clock from `--now`, else the system clock at the configured offset
pub fn build_clock(now: Option<&str>, utc_offset: &str) -> RolloutResult<Box<dyn Clock>> {
    let offset = parse_utc_offset(utc_offset)?;
    let clock: Box<dyn Clock> = match now {
        Some(raw) => Box::new(FixedClock(parse_local_instant(raw, offset)?)),
        None => Box::new(SystemClock::new(offset)),
    };
    Ok(clock)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PeriodOutput<'a> {
    token: &'a str,
    window: Option<Period>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AggregateOutput<'a> {
    metric: &'a str,
    period: Option<&'a str>,
    entities: &'a [String],
    trend: TrendResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    comparative: Option<ComparativeTrendResult>,
}

pub async fn run(ctx: &Context, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Period { token } => {
            let window = resolve_period(&token, ctx.clock.now());
            match ctx.format {
                OutputFormat::Table => {
                    println!("{}", output::render_period(&token, window.as_ref()))
                },
                OutputFormat::Json => println!(
                    "{}",
                    output::to_json(&PeriodOutput {
                        token: &token,
                        window,
                    })?
                ),
            }
        },
        Commands::Trend {
            metric,
            entity,
            period,
        } => {
            let snapshot = load_with_retry(&ctx.loader()?, ctx.clock.as_ref()).await?;
            let trend = trend_for(
                &snapshot.events,
                &metric,
                entity.as_deref(),
                period.as_deref(),
                ctx.clock.now(),
            );
            let label = entity.as_deref().unwrap_or(&metric);
            match ctx.format {
                OutputFormat::Table => println!("{}", output::render_trend(label, &trend)),
                OutputFormat::Json => println!("{}", output::to_json(&trend)?),
            }
        },
        Commands::Compare {
            metric,
            entity,
            period,
        } => {
            let token = ctx.period_or_default(period);
            if !is_comparable(&token) {
                warn!("'{}' has no comparable previous period", token);
            }
            let snapshot = load_with_retry(&ctx.loader()?, ctx.clock.as_ref()).await?;
            let result = calculate_comparative_trend(
                &snapshot.events,
                &metric,
                entity.as_deref(),
                &token,
                ctx.clock.now(),
            );
            let label = entity.as_deref().unwrap_or(&metric);
            match ctx.format {
                OutputFormat::Table => {
                    println!("{}", output::render_comparative(label, &result))
                },
                OutputFormat::Json => println!("{}", output::to_json(&result)?),
            }
        },
        Commands::Aggregate {
            metric,
            entities,
            period,
        } => {
            let snapshot = load_with_retry(&ctx.loader()?, ctx.clock.as_ref()).await?;
            let entities = select_entities(entities, &ctx.config.entities, &snapshot.events);
            let now = ctx.clock.now();
            let trend =
                aggregate_for(&snapshot.events, &metric, &entities, period.as_deref(), now);
            let comparative = period
                .as_deref()
                .filter(|token| is_comparable(token))
                .map(|token| {
                    calculate_aggregate_comparative_trend(
                        &snapshot.events,
                        &metric,
                        &entities,
                        token,
                        now,
                    )
                });

            match ctx.format {
                OutputFormat::Table => {
                    let label = format!("{} ({} entities)", metric, entities.len());
                    println!("{}", output::render_trend(&label, &trend));
                    if let Some(comparative) = &comparative {
                        println!("{}", output::render_comparative("  rate", comparative));
                    }
                },
                OutputFormat::Json => println!(
                    "{}",
                    output::to_json(&AggregateOutput {
                        metric: &metric,
                        period: period.as_deref(),
                        entities: &entities,
                        trend,
                        comparative,
                    })?
                ),
            }
        },
        Commands::Report { period, watch } => {
            let token = ctx.period_or_default(period);
            let loader = ctx.loader()?;
            let builder = ReportBuilder::new(ctx.clock.as_ref())
                .with_metrics(ctx.config.metrics.clone())
                .with_entities(ctx.config.entities.clone());

            if watch {
                watch_report(ctx, &loader, &builder, &token).await?;
            } else {
                let snapshot = load_with_retry(&loader, ctx.clock.as_ref()).await?;
                let report = builder.build(&snapshot.events, &token);
                print_report(ctx.format, &report)?;
            }
        },
    }
    Ok(())
}

fn is_comparable(token: &str) -> bool {
    token
        .parse::<PeriodToken>()
        .is_ok_and(|t| t.supports_comparison())
}

/// Windowed trend when a period is given, else the latest two observations
fn trend_for(
    events: &[Event],
    metric: &str,
    entity: Option<&str>,
    period: Option<&str>,
    now: NaiveDateTime,
) -> TrendResult {
    match period {
        Some(token) => calculate_period_trend(events, metric, entity, token, now),
        None => calculate_trend(events, metric, entity, None),
    }
}

fn aggregate_for(
    events: &[Event],
    metric: &str,
    entities: &[String],
    period: Option<&str>,
    now: NaiveDateTime,
) -> TrendResult {
    match period {
        Some(token) => calculate_aggregate_period_trend(events, metric, entities, token, now),
        None => calculate_aggregate_trend(events, metric, entities, None),
    }
}

/// Explicit entities, then configured ones, then whatever the feed has
fn select_entities(explicit: Vec<String>, configured: &[String], events: &[Event]) -> Vec<String> {
    if !explicit.is_empty() {
        explicit
    } else if !configured.is_empty() {
        configured.to_vec()
    } else {
        distinct_entities(events)
    }
}

/// Load a snapshot, retrying transient failures per the error's hints
async fn load_with_retry(loader: &FeedLoader, clock: &dyn Clock) -> RolloutResult<EventSnapshot> {
    let mut attempt = 0u32;
    loop {
        match loader.load(clock.now()).await {
            Ok(snapshot) => return Ok(snapshot),
            Err(e) if e.is_retryable() && attempt < e.max_retries() => {
                attempt += 1;
                warn!(
                    code = e.error_code(),
                    attempt,
                    "Feed {} unavailable, retrying: {}",
                    loader.source(),
                    e
                );
                tokio::time::sleep(Duration::from_millis(e.retry_delay_ms())).await;
            },
            Err(e) => return Err(e),
        }
    }
}

fn print_report(format: OutputFormat, report: &TrendReport) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", output::render_report(report)),
        OutputFormat::Json => println!("{}", output::to_json(report)?),
    }
    Ok(())
}

/// Reprint the report every refresh interval until Ctrl+C or SIGTERM
///
/// Transient feed failures keep the last good snapshot on screen; anything
/// else ends the watch.
async fn watch_report<C: Clock>(
    ctx: &Context,
    loader: &FeedLoader,
    builder: &ReportBuilder<C>,
    token: &str,
) -> Result<()> {
    let refresh = Duration::from_secs(ctx.config.feed.refresh_secs);
    let max_age = Duration::from_secs(ctx.config.feed.max_age_secs);
    info!(
        source = %loader.source(),
        refresh_secs = ctx.config.feed.refresh_secs,
        "Watching {}",
        token
    );

    let mut ticker = tokio::time::interval(refresh);
    let shutdown = wait_for_shutdown();
    tokio::pin!(shutdown);
    let mut last_good: Option<EventSnapshot> = None;

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Stopping watch");
                return Ok(());
            },
            _ = ticker.tick() => {},
        }

        let now = ctx.clock.now();
        match loader.load(now).await {
            Ok(snapshot) => last_good = Some(snapshot),
            Err(e) if e.is_retryable() => {
                warn!(
                    code = e.error_code(),
                    "Feed refresh failed, keeping last snapshot: {}",
                    e
                );
            },
            Err(e) => return Err(e.into()),
        }

        let Some(snapshot) = &last_good else {
            debug!("No snapshot yet");
            continue;
        };
        if snapshot.is_stale(now, max_age) {
            warn!(fetched_at = %snapshot.fetched_at, "Report is based on a stale snapshot");
        }
        let report = builder.build_at(&snapshot.events, token, now);
        print_report(ctx.format, &report)?;
    }
}
