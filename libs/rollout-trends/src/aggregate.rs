//! Aggregator - national rollups over many entities
//!
//! Per-entity results are summed, then change, percentage and direction are
//! recomputed from the sums. The aggregate direction reflects net movement,
//! not a majority vote of entity directions.

use chrono::NaiveDateTime;
use tracing::debug;

use crate::comparative::{calculate_comparative_trend, ComparativeTrendResult};
use crate::event::Event;
use crate::period::{resolve_period, Period};
use crate::trend::{calculate_trend, TrendResult};

/// Sum trends that carry data; `no_data()` if none do
pub fn aggregate_trends<I>(results: I) -> TrendResult
where
    I: IntoIterator<Item = TrendResult>,
{
    let mut survivors = 0usize;
    let (current, previous) = results
        .into_iter()
        .filter(|r| r.has_data)
        .fold((0.0, 0.0), |(cur, prev), r| {
            survivors += 1;
            (cur + r.current_value, prev + r.previous_value)
        });

    if survivors == 0 {
        return TrendResult::no_data();
    }
    TrendResult::from_values(current, previous)
}

/// Sum comparative results that carry data; `no_data()` if none do
pub fn aggregate_comparative_trends<I>(results: I) -> ComparativeTrendResult
where
    I: IntoIterator<Item = ComparativeTrendResult>,
{
    let mut survivors = 0usize;
    let mut current_rate = 0.0;
    let mut previous_rate = 0.0;
    let mut current_total = 0.0;
    let mut previous_total = 0.0;

    for r in results.into_iter().filter(|r| r.has_data) {
        survivors += 1;
        current_rate += r.current_daily_rate;
        previous_rate += r.previous_daily_rate;
        current_total += r.current_total;
        previous_total += r.previous_total;
    }

    if survivors == 0 {
        return ComparativeTrendResult::no_data();
    }
    ComparativeTrendResult::from_rates(current_rate, previous_rate, current_total, previous_total)
}

/// Combined trend of `metric` across `entities`
pub fn calculate_aggregate_trend<S: AsRef<str>>(
    events: &[Event],
    metric: &str,
    entities: &[S],
    window: Option<&Period>,
) -> TrendResult {
    let result = aggregate_trends(
        entities
            .iter()
            .map(|e| calculate_trend(events, metric, Some(e.as_ref()), window)),
    );
    debug!(
        metric,
        entities = entities.len(),
        current = result.current_value,
        previous = result.previous_value,
        "aggregate trend"
    );
    result
}

/// Combined trend over a named period; unknown tokens yield `no_data()`
pub fn calculate_aggregate_period_trend<S: AsRef<str>>(
    events: &[Event],
    metric: &str,
    entities: &[S],
    token: &str,
    now: NaiveDateTime,
) -> TrendResult {
    match resolve_period(token, now) {
        Some(period) => calculate_aggregate_trend(events, metric, entities, Some(&period)),
        None => TrendResult::no_data(),
    }
}

/// Combined period-over-period comparison across `entities`
pub fn calculate_aggregate_comparative_trend<S: AsRef<str>>(
    events: &[Event],
    metric: &str,
    entities: &[S],
    token: &str,
    now: NaiveDateTime,
) -> ComparativeTrendResult {
    let result = aggregate_comparative_trends(
        entities
            .iter()
            .map(|e| calculate_comparative_trend(events, metric, Some(e.as_ref()), token, now)),
    );
    debug!(
        metric,
        token,
        entities = entities.len(),
        current_rate = result.current_daily_rate,
        previous_rate = result.previous_daily_rate,
        "aggregate comparative trend"
    );
    result
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use crate::trend::Direction;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_net_movement_beats_majority() {
        // Two entities up a little, one down a lot
        let results = vec![
            TrendResult::from_values(11.0, 10.0),
            TrendResult::from_values(11.0, 10.0),
            TrendResult::from_values(50.0, 100.0),
        ];
        let agg = aggregate_trends(results);
        assert_eq!(agg.current_value, 72.0);
        assert_eq!(agg.previous_value, 120.0);
        assert_eq!(agg.direction, Direction::Down);
        assert_eq!(agg.change_percentage, -40.0);
    }

    #[test]
    fn test_all_filtered_is_no_data() {
        let agg = aggregate_trends(vec![TrendResult::no_data(), TrendResult::no_data()]);
        assert_eq!(agg, TrendResult::no_data());

        let empty: [&str; 0] = [];
        assert!(!calculate_aggregate_trend(&[], "x", &empty, None).has_data);
    }

    #[test]
    fn test_aggregate_comparative_sums_rates_and_totals() {
        let results = vec![
            ComparativeTrendResult::from_rates(3.0, 2.0, 9.0, 14.0),
            ComparativeTrendResult::no_data(),
            ComparativeTrendResult::from_rates(1.0, 2.0, 3.0, 14.0),
        ];
        let agg = aggregate_comparative_trends(results);
        assert_eq!(agg.current_daily_rate, 4.0);
        assert_eq!(agg.previous_daily_rate, 4.0);
        assert_eq!(agg.current_total, 12.0);
        assert_eq!(agg.previous_total, 28.0);
        assert_eq!(agg.direction, Direction::Stable);
        assert!(agg.has_data);
    }

    #[test]
    fn test_aggregate_period_trend_unknown_token() {
        let now = date(2024, 1, 10).and_hms_opt(0, 0, 0).unwrap();
        let events = vec![Event::new(date(2024, 1, 9), "x", 1.0, "A")];
        let r = calculate_aggregate_period_trend(&events, "x", &["A"], "someday", now);
        assert!(!r.has_data);

        let r = calculate_aggregate_comparative_trend(&events, "x", &["A"], "today", now);
        assert!(!r.has_data);
    }
}
