//! rollout-trends - Trend and comparison engine for fiber rollout progress
//!
//! Computes directional deltas over a sparse, irregularly timestamped log of
//! cumulative counters (one series per metric and region).
//!
//! # Features
//!
//! - **Period resolution**: `today`, `current-week`, `last-week`, `current-month`, `last-month`
//! - **Trends**: latest value against prior value, with or without a window
//! - **Comparisons**: period-over-period daily rates
//! - **Rollups**: national aggregates recomputed from summed entity values
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use rollout_trends::{calculate_trend, resolve_period, Direction, Event};
//!
//! let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
//! let events = vec![
//!     Event::new(day(1), "hotoGPsDone", 10.0, "Bihar"),
//!     Event::new(day(8), "hotoGPsDone", 25.0, "Bihar"),
//! ];
//!
//! // Latest two observations
//! let trend = calculate_trend(&events, "hotoGPsDone", Some("Bihar"), None);
//! assert_eq!(trend.change_value, 15.0);
//! assert_eq!(trend.direction, Direction::Up);
//!
//! // Within a resolved period
//! let now = day(10).and_hms_opt(9, 0, 0).unwrap();
//! let week = resolve_period("current-week", now).unwrap();
//! let trend = calculate_trend(&events, "hotoGPsDone", Some("Bihar"), Some(&week));
//! assert_eq!(trend.current_value, 25.0);
//! ```
//!
//! # Calculators
//!
//! | Function | Result | Unresolved period |
//! |----------|--------|-------------------|
//! | `calculate_trend` | `TrendResult` | n/a (explicit window) |
//! | `calculate_period_trend` | `TrendResult` | `has_data = false` |
//! | `calculate_comparative_trend` | `ComparativeTrendResult` | `has_data = false` |
//! | `calculate_aggregate_trend` | `TrendResult` | n/a (explicit window) |
//! | `calculate_aggregate_period_trend` | `TrendResult` | `has_data = false` |
//! | `calculate_aggregate_comparative_trend` | `ComparativeTrendResult` | `has_data = false` |
//!
//! None of the calculators read the system clock; pass `now` explicitly or
//! go through [`ReportBuilder`] with a [`Clock`].

pub mod aggregate;
pub mod clock;
pub mod comparative;
pub mod error;
pub mod event;
pub mod period;
pub mod report;
pub mod trend;

// Re-exports for convenience
pub use aggregate::{
    aggregate_comparative_trends, aggregate_trends, calculate_aggregate_comparative_trend,
    calculate_aggregate_period_trend, calculate_aggregate_trend,
};
pub use clock::{parse_local_instant, parse_utc_offset, Clock, FixedClock, SystemClock};
pub use comparative::{calculate_comparative_trend, daily_rate, ComparativeTrendResult};
pub use error::{Result, TrendError};
pub use event::{
    distinct_entities, distinct_metrics, parse_event_date, Event, EventFeed, FeedRecord,
};
pub use period::{previous_comparable, resolve_period, Period, PeriodToken};
pub use report::{EntityTrend, MetricReport, ReportBuilder, TrendReport};
pub use trend::{calculate_period_trend, calculate_trend, change_percentage, Direction, TrendResult};
