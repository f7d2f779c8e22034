//! Integration tests for trend, period and rollup behavior
//!
//! Every test freezes `now` so period boundaries are reproducible.

#![allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable

use chrono::{NaiveDate, NaiveDateTime};
use rollout_trends::{
    aggregate_trends, calculate_aggregate_comparative_trend, calculate_aggregate_trend,
    calculate_comparative_trend, calculate_period_trend, calculate_trend, parse_utc_offset,
    resolve_period, Direction, Event, EventFeed, Period, PeriodToken, TrendResult,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(h, 0, 0).unwrap()
}

fn scenario_events() -> Vec<Event> {
    vec![
        Event::new(date(2024, 1, 1), "x", 10.0, "A"),
        Event::new(date(2024, 1, 8), "x", 25.0, "A"),
    ]
}

/// A small multi-entity feed with distinct dates per series
fn regional_feed() -> Vec<Event> {
    vec![
        Event::new(date(2023, 12, 20), "gp", 40.0, "A"),
        Event::new(date(2023, 12, 30), "gp", 55.0, "A"),
        Event::new(date(2024, 1, 4), "gp", 70.0, "A"),
        Event::new(date(2024, 1, 9), "gp", 82.0, "A"),
        Event::new(date(2023, 12, 21), "gp", 5.0, "B"),
        Event::new(date(2024, 1, 2), "gp", 9.0, "B"),
        Event::new(date(2024, 1, 8), "gp", 8.0, "B"),
        Event::new(date(2024, 1, 3), "km", 1.5, "B"),
    ]
}

// ==================== Scenarios ====================

#[test]
fn scenario_a_legacy_trend() {
    let t = calculate_trend(&scenario_events(), "x", Some("A"), None);
    assert_eq!(t.current_value, 25.0);
    assert_eq!(t.previous_value, 10.0);
    assert_eq!(t.change_value, 15.0);
    assert_eq!(t.change_percentage, 150.0);
    assert_eq!(t.direction, Direction::Up);
    assert!(t.has_data);
}

#[test]
fn scenario_b_empty_window() {
    let window = Period::from_dates(date(2024, 1, 9), date(2024, 1, 15)).unwrap();
    let t = calculate_trend(&scenario_events(), "x", Some("A"), Some(&window));
    assert_eq!(t.current_value, 0.0);
    assert_eq!(t.previous_value, 0.0);
    assert_eq!(t.change_value, 0.0);
    assert_eq!(t.direction, Direction::Stable);
    assert!(t.has_data);
}

#[test]
fn scenario_c_single_event() {
    let today = date(2024, 5, 17);
    let events = vec![Event::new(today, "x", 5.0, "A")];
    let t = calculate_trend(&events, "x", None, None);
    assert_eq!(t.previous_value, 0.0);
    assert_eq!(t.current_value, 5.0);
    assert_eq!(t.direction, Direction::Up);
    assert_eq!(t.change_percentage, 0.0);
}

#[test]
fn scenario_d_last_week_on_wednesday() {
    let now = at(2024, 1, 10, 11);
    let current = resolve_period("current-week", now).unwrap();
    assert_eq!(current.start, at(2024, 1, 7, 0));

    let last = resolve_period("last-week", now).unwrap();
    assert_eq!(last.start, at(2023, 12, 31, 0));
    assert_eq!(
        last.end,
        date(2024, 1, 6).and_hms_milli_opt(23, 59, 59, 999).unwrap()
    );
}

#[test]
fn scenario_e_aggregate_skips_entities_without_data() {
    let b = TrendResult::from_values(10.0, 4.0);
    let agg = aggregate_trends([TrendResult::no_data(), b]);
    assert_eq!(agg, b);
    assert!(agg.has_data);
}

// ==================== Properties ====================

#[test]
fn p1_input_order_does_not_matter() {
    let feed = regional_feed();
    let window = resolve_period("current-month", at(2024, 1, 10, 8)).unwrap();
    let expected_legacy = calculate_trend(&feed, "gp", Some("A"), None);
    let expected_window = calculate_trend(&feed, "gp", Some("B"), Some(&window));

    let mut reversed = feed.clone();
    reversed.reverse();
    let mut permutations = vec![reversed];
    for shift in 1..feed.len() {
        let mut rotated = feed.clone();
        rotated.rotate_left(shift);
        permutations.push(rotated);
    }

    for events in permutations {
        assert_eq!(calculate_trend(&events, "gp", Some("A"), None), expected_legacy);
        assert_eq!(
            calculate_trend(&events, "gp", Some("B"), Some(&window)),
            expected_window
        );
    }
}

#[test]
fn p2_zero_previous_never_divides() {
    for current in [0.0, 1.0, -3.0, 1e12] {
        let t = TrendResult::from_values(current, 0.0);
        assert_eq!(t.change_percentage, 0.0);
        assert!(t.change_percentage.is_finite());
    }
}

#[test]
fn p3_direction_matches_sign() {
    let now = at(2024, 1, 10, 8);
    let feed = regional_feed();
    let mut trends = Vec::new();
    for entity in ["A", "B"] {
        trends.push(calculate_trend(&feed, "gp", Some(entity), None));
        for token in PeriodToken::ALL {
            let window = token.resolve(now).unwrap();
            trends.push(calculate_trend(&feed, "gp", Some(entity), Some(&window)));
        }
    }
    for t in trends {
        let expected = if t.change_value > 0.0 {
            Direction::Up
        } else if t.change_value < 0.0 {
            Direction::Down
        } else {
            Direction::Stable
        };
        assert_eq!(t.direction, expected);
    }

    for token in ["current-week", "current-month"] {
        let c = calculate_comparative_trend(&feed, "gp", Some("A"), token, now);
        assert_eq!(c.direction, Direction::from_change(c.change_value));
    }
}

#[test]
fn p4_aggregate_equals_sum_of_entities() {
    let feed = regional_feed();
    let a = calculate_trend(&feed, "gp", Some("A"), None);
    let b = calculate_trend(&feed, "gp", Some("B"), None);
    let agg = calculate_aggregate_trend(&feed, "gp", &["A", "B"], None);
    assert_eq!(agg.current_value, a.current_value + b.current_value);
    assert_eq!(agg.previous_value, a.previous_value + b.previous_value);
}

#[test]
fn p5_period_resolution_is_repeatable() {
    let now = at(2024, 2, 29, 23);
    for token in PeriodToken::ALL {
        let first = resolve_period(token.as_str(), now);
        let second = resolve_period(token.as_str(), now);
        assert!(first.is_some());
        assert_eq!(first, second);
    }
}

// ==================== Pinned behavior ====================

#[test]
fn metric_never_observed_still_reports_has_data() {
    let t = calculate_trend(&regional_feed(), "fiberKmLaid", None, None);
    assert!(t.has_data);
    assert_eq!(t.direction, Direction::Stable);
}

#[test]
fn aggregate_comparative_over_regions() {
    // Current week Jan 7..=Jan 10; previous Dec 31..=Jan 6
    let now = at(2024, 1, 10, 8);
    let feed = regional_feed();
    let agg =
        calculate_aggregate_comparative_trend(&feed, "gp", &["A", "B"], "current-week", now);

    // A: current 82-70=12 over 2 days, previous 70-55=15 over 4 days
    // B: current 8-9=-1 over 1 day, previous 9-5=4 over 2 days
    assert_eq!(agg.current_total, 11.0);
    assert_eq!(agg.previous_total, 19.0);
    assert_eq!(agg.current_daily_rate, 6.0 - 1.0);
    assert_eq!(agg.previous_daily_rate, 3.75 + 2.0);
    assert_eq!(agg.direction, Direction::Down);

    let rejected =
        calculate_aggregate_comparative_trend(&feed, "gp", &["A", "B"], "last-week", now);
    assert!(!rejected.has_data);
}

#[test]
fn feed_json_round_into_trend() {
    let json = r#"{"events": [
        {"timestamp": "2024-01-08", "metricName": "x", "value": "25", "entity": "A"},
        {"timestamp": "2024-01-01T00:00:00Z", "metricName": "x", "value": 10, "entity": "A"}
    ]}"#;
    let feed: EventFeed = serde_json::from_str(json).unwrap();
    let events = feed.into_events(parse_utc_offset("+05:30").unwrap()).unwrap();
    let t = calculate_trend(&events, "x", Some("A"), None);
    assert_eq!(t.change_value, 15.0);
}

#[test]
fn utc_stamp_after_local_midnight_counts_in_current_week() {
    // 2024-01-06T20:00Z is Sunday 01:30 at +05:30, the first day of the week
    let json = r#"{"events": [
        {"timestamp": "2024-01-01", "metricName": "x", "value": 10, "entity": "A"},
        {"timestamp": "2024-01-06T20:00:00Z", "metricName": "x", "value": 40, "entity": "A"}
    ]}"#;
    let feed: EventFeed = serde_json::from_str(json).unwrap();
    let events = feed.into_events(parse_utc_offset("+05:30").unwrap()).unwrap();
    let now = NaiveDate::from_ymd_opt(2024, 1, 10)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();

    let t = calculate_period_trend(&events, "x", Some("A"), "current-week", now);
    assert!(t.has_data);
    assert_eq!(t.current_value, 40.0);
    assert_eq!(t.previous_value, 10.0);
    assert_eq!(t.direction, Direction::Up);
}

#[test]
fn blank_counter_cell_does_not_collapse_series() {
    let json = r#"{"events": [
        {"timestamp": "2024-01-01", "metricName": "x", "value": 500, "entity": "A"},
        {"timestamp": "2024-01-08", "metricName": "x", "value": "", "entity": "A"}
    ]}"#;
    let feed: EventFeed = serde_json::from_str(json).unwrap();
    let events = feed.into_events(parse_utc_offset("+05:30").unwrap()).unwrap();
    let t = calculate_trend(&events, "x", Some("A"), None);
    assert_eq!(t.current_value, 500.0);
    assert_eq!(t.change_value, 500.0);
    assert_ne!(t.direction, Direction::Down);
}
