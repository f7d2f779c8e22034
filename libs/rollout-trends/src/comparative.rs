//! Comparative Calculator - period-over-period daily rates
//!
//! Compares the current week (or month) against the period immediately
//! before it. Each period's net change is normalized to a per-day rate so a
//! partially elapsed period can be compared with a complete one.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::event::Event;
use crate::period::{previous_comparable, Period, PeriodToken};
use crate::trend::{calculate_trend, Direction};

/// Rate comparison between two consecutive periods
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparativeTrendResult {
    pub direction: Direction,
    pub current_daily_rate: f64,
    pub previous_daily_rate: f64,
    /// Net change over the current period
    pub current_total: f64,
    /// Net change over the previous period
    pub previous_total: f64,
    /// `current_daily_rate - previous_daily_rate`
    pub change_value: f64,
    pub change_percentage: f64,
    pub has_data: bool,
}

impl ComparativeTrendResult {
    pub fn from_rates(
        current_daily_rate: f64,
        previous_daily_rate: f64,
        current_total: f64,
        previous_total: f64,
    ) -> Self {
        let change_value = current_daily_rate - previous_daily_rate;
        let change_percentage = if previous_daily_rate > 0.0 {
            change_value / previous_daily_rate * 100.0
        } else {
            0.0
        };
        Self {
            direction: Direction::from_change(change_value),
            current_daily_rate,
            previous_daily_rate,
            current_total,
            previous_total,
            change_value,
            change_percentage,
            has_data: true,
        }
    }

    pub fn no_data() -> Self {
        Self {
            has_data: false,
            ..Self::from_rates(0.0, 0.0, 0.0, 0.0)
        }
    }
}

/// Net change divided by the days elapsed from the period start to the last
/// matching event inside it (at least one day)
pub fn daily_rate(
    events: &[Event],
    metric: &str,
    entity: Option<&str>,
    period: &Period,
    change: f64,
) -> f64 {
    let last_date = events
        .iter()
        .filter(|e| e.matches(metric, entity) && period.contains(e.instant()))
        .map(|e| e.date)
        .max();
    let elapsed = last_date.map_or(0, |d| (d - period.start.date()).num_days());
    change / elapsed.max(1) as f64
}

/// Compare the period named by `token` with its predecessor
///
/// Only `current-week` and `current-month` are comparable; any other token,
/// known or not, yields a `has_data = false` result.
pub fn calculate_comparative_trend(
    events: &[Event],
    metric: &str,
    entity: Option<&str>,
    token: &str,
    now: NaiveDateTime,
) -> ComparativeTrendResult {
    let token = match token.parse::<PeriodToken>() {
        Ok(t) if t.supports_comparison() => t,
        _ => {
            debug!(token, "period not comparable");
            return ComparativeTrendResult::no_data();
        },
    };

    let (Some(current), Some(previous)) = (token.resolve(now), previous_comparable(token, now))
    else {
        debug!(%token, "period boundaries not resolved");
        return ComparativeTrendResult::no_data();
    };

    let current_trend = calculate_trend(events, metric, entity, Some(&current));
    let previous_trend = calculate_trend(events, metric, entity, Some(&previous));

    let current_rate = daily_rate(events, metric, entity, &current, current_trend.change_value);
    let previous_rate = daily_rate(
        events,
        metric,
        entity,
        &previous,
        previous_trend.change_value,
    );

    let result = ComparativeTrendResult::from_rates(
        current_rate,
        previous_rate,
        current_trend.change_value,
        previous_trend.change_value,
    );
    debug!(
        metric,
        entity,
        %token,
        current_rate,
        previous_rate,
        direction = %result.direction,
        "comparative trend"
    );
    result
}
