//! Trend Calculator - latest value against prior value
//!
//! Works on cumulative counters: the "current" value is the latest
//! observation in the window, the "previous" value is the latest observation
//! strictly before it. Nothing here fails; absence is reported in-band via
//! zeroed fields and `has_data`.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, trace};

use crate::event::Event;
use crate::period::{resolve_period, Period};

/// Direction of movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Stable,
}

impl Direction {
    /// Sign of `change`; zero and NaN are `Stable`
    pub fn from_change(change: f64) -> Self {
        if change > 0.0 {
            Self::Up
        } else if change < 0.0 {
            Self::Down
        } else {
            Self::Stable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Stable => "stable",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Movement of one metric between two observations
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendResult {
    pub direction: Direction,
    pub current_value: f64,
    pub previous_value: f64,
    pub change_value: f64,
    pub change_percentage: f64,
    /// `false` only when the period could not be resolved
    pub has_data: bool,
}

impl TrendResult {
    /// Derive change, percentage and direction from the two values
    pub fn from_values(current_value: f64, previous_value: f64) -> Self {
        let change_value = current_value - previous_value;
        Self {
            direction: Direction::from_change(change_value),
            current_value,
            previous_value,
            change_value,
            change_percentage: change_percentage(change_value, previous_value),
            has_data: true,
        }
    }

    /// Known metric with nothing to compare
    pub fn empty() -> Self {
        Self::from_values(0.0, 0.0)
    }

    /// Period could not be resolved
    pub fn no_data() -> Self {
        Self {
            has_data: false,
            ..Self::empty()
        }
    }
}

/// Percentage change relative to `previous`; 0 when `previous` is 0
///
/// A move from 0 to any value therefore reports 0%.
pub fn change_percentage(change: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        0.0
    } else {
        change / previous * 100.0
    }
}

/// Matching events sorted ascending by date; equal dates keep input order
pub(crate) fn sorted_series<'a>(
    events: &'a [Event],
    metric: &str,
    entity: Option<&str>,
) -> Vec<&'a Event> {
    let mut series: Vec<&Event> = events
        .iter()
        .filter(|e| e.matches(metric, entity))
        .collect();
    series.sort_by_key(|e| e.date);
    series
}

/// Compute the trend of `metric` (optionally for one `entity`)
///
/// Without a window the last two observations are compared. With a window
/// the latest in-window observation is compared against the latest one
/// strictly before the window start.
pub fn calculate_trend(
    events: &[Event],
    metric: &str,
    entity: Option<&str>,
    window: Option<&Period>,
) -> TrendResult {
    let series = sorted_series(events, metric, entity);
    if series.is_empty() {
        trace!(metric, entity, "no events for metric");
        return TrendResult::empty();
    }

    let result = match window {
        None => {
            let mut latest = series.iter().rev();
            let current = latest.next().map_or(0.0, |e| e.value);
            let previous = latest.next().map_or(0.0, |e| e.value);
            TrendResult::from_values(current, previous)
        },
        Some(period) => {
            let Some(current) = series.iter().rev().find(|e| period.contains(e.instant()))
            else {
                trace!(metric, entity, "no events inside window");
                return TrendResult::empty();
            };
            let previous = series
                .iter()
                .rev()
                .find(|e| e.instant() < period.start)
                .map_or(0.0, |e| e.value);
            TrendResult::from_values(current.value, previous)
        },
    };

    debug!(
        metric,
        entity,
        current = result.current_value,
        previous = result.previous_value,
        direction = %result.direction,
        "trend"
    );
    result
}

/// Trend over a named period resolved at `now`
///
/// Unknown tokens yield a `has_data = false` result.
pub fn calculate_period_trend(
    events: &[Event],
    metric: &str,
    entity: Option<&str>,
    token: &str,
    now: NaiveDateTime,
) -> TrendResult {
    match resolve_period(token, now) {
        Some(period) => calculate_trend(events, metric, entity, Some(&period)),
        None => {
            debug!(token, "period not resolved");
            TrendResult::no_data()
        },
    }
}
