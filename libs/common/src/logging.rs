//! Logging setup for the rollout tools
//!
//! Console output uses a compact `timestamp [LEVEL] message` format. An
//! optional daily-rolling file layer (JSON or text) is added when a log
//! directory is configured.

use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use errors::{RolloutError, RolloutResult};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::Writer, FmtContext, FormatEvent, FormatFields},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::config_loader::LoggingConfig;

/// Custom format for log level with brackets: `[INFO]`, `[WARN]`, etc.
fn format_level(level: &Level) -> &'static str {
    match *level {
        Level::TRACE => "[TRACE]",
        Level::DEBUG => "[DEBUG]",
        Level::INFO => "[INFO]",
        Level::WARN => "[WARN]",
        Level::ERROR => "[ERROR]",
    }
}

/// Event formatter that outputs: `timestamp [LEVEL] message fields`
///
/// Example output: `2024-01-10T04:30:00.000000Z [INFO] Trend report built metrics=3`
struct BracketedLevelFormat;

impl<S, N> FormatEvent<S, N> for BracketedLevelFormat
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let now = chrono::Utc::now();
        write!(writer, "{} ", now.format("%Y-%m-%dT%H:%M:%S%.6fZ"))?;

        let level = *event.metadata().level();
        if writer.has_ansi_escapes() {
            let color = match level {
                Level::TRACE => "\x1b[35m", // magenta
                Level::DEBUG => "\x1b[34m", // blue
                Level::INFO => "\x1b[32m",  // green
                Level::WARN => "\x1b[33m",  // yellow
                Level::ERROR => "\x1b[31m", // red
            };
            write!(writer, "{}{}\x1b[0m ", color, format_level(&level))?;
        } else {
            write!(writer, "{} ", format_level(&level))?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

// Keeps the non-blocking file writer alive for the process lifetime
static GUARDS: OnceLock<Mutex<Vec<WorkerGuard>>> = OnceLock::new();

/// Logger configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Binary name, used as the log file prefix
    pub service_name: String,
    /// Filter directive when `RUST_LOG` is unset (e.g. "info", "debug,reqwest=warn")
    pub level: String,
    /// JSON output instead of the bracketed text format
    pub enable_json: bool,
    /// Daily log files go here; console only when `None`
    pub log_dir: Option<PathBuf>,
    /// ANSI colors on the console
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "trendctl".to_string(),
            level: "info".to_string(),
            enable_json: false,
            log_dir: None,
            ansi: true,
        }
    }
}

impl LogConfig {
    /// Build from the `logging` config section
    pub fn from_settings(service_name: &str, settings: &LoggingConfig) -> Self {
        Self {
            service_name: service_name.to_string(),
            level: settings.level.clone(),
            enable_json: settings.json,
            log_dir: resolve_log_dir(settings.dir.as_deref()),
            ansi: true,
        }
    }
}

/// Log directory: `ROLLOUT_LOG_DIR` env wins over the configured one
pub fn resolve_log_dir(configured: Option<&str>) -> Option<PathBuf> {
    std::env::var("ROLLOUT_LOG_DIR")
        .ok()
        .filter(|d| !d.is_empty())
        .or_else(|| configured.map(str::to_string))
        .map(PathBuf::from)
}

/// Filter directive: `RUST_LOG` when set, else the configured level
pub fn filter_directive(configured: &str) -> String {
    match std::env::var("RUST_LOG") {
        Ok(env) if !env.trim().is_empty() => env,
        _ => configured.to_string(),
    }
}

/// Initialize the global subscriber
///
/// Returns an error if the directive is invalid, the log directory cannot be
/// created, or a global subscriber is already installed.
pub fn init_with_config(config: LogConfig) -> RolloutResult<()> {
    let directive = filter_directive(&config.level);
    let env_filter = EnvFilter::try_new(&directive).map_err(|e| RolloutError::InvalidConfig {
        field: "logging.level".to_string(),
        reason: format!("'{}': {}", directive, e),
    })?;

    let console_layer = if config.enable_json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(config.ansi)
            .event_format(BracketedLevelFormat)
            .boxed()
    };

    let file_layer = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender =
                tracing_appender::rolling::daily(dir, format!("{}.log", config.service_name));
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);

            let guards = GUARDS.get_or_init(|| Mutex::new(Vec::new()));
            match guards.lock() {
                Ok(mut guards) => guards.push(guard),
                Err(poisoned) => poisoned.into_inner().push(guard),
            }

            let layer = if config.enable_json {
                fmt::layer()
                    .json()
                    .with_writer(non_blocking)
                    .with_target(true)
                    .boxed()
            } else {
                fmt::layer()
                    .with_writer(non_blocking)
                    .with_ansi(false)
                    .event_format(BracketedLevelFormat)
                    .boxed()
            };
            Some(layer)
        },
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| RolloutError::Runtime(format!("Logging already initialized: {}", e)))?;

    tracing::debug!(
        filter = %directive,
        file = ?config.log_dir,
        "Logging: {}",
        config.service_name
    );
    Ok(())
}
