//! Trend reports - per-metric national rollups plus per-entity rows
//!
//! This is the outermost caller of the calculators, so it is the one place
//! that reads a [`Clock`].

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::aggregate::{aggregate_comparative_trends, aggregate_trends};
use crate::clock::Clock;
use crate::comparative::{calculate_comparative_trend, ComparativeTrendResult};
use crate::event::{distinct_entities, distinct_metrics, Event};
use crate::period::{Period, PeriodToken};
use crate::trend::{calculate_trend, Direction, TrendResult};

/// One entity's row within a metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityTrend {
    pub entity: String,
    pub trend: TrendResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparative: Option<ComparativeTrendResult>,
}

/// All rows for one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricReport {
    pub metric: String,
    pub national: TrendResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub national_comparative: Option<ComparativeTrendResult>,
    pub entities: Vec<EntityTrend>,
}

impl MetricReport {
    /// Entities moving in `direction`
    pub fn entities_moving(&self, direction: Direction) -> impl Iterator<Item = &EntityTrend> {
        self.entities
            .iter()
            .filter(move |row| row.trend.has_data && row.trend.direction == direction)
    }
}

/// Full report for one period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendReport {
    pub generated_at: NaiveDateTime,
    pub period: String,
    /// `None` when the token did not resolve
    pub window: Option<Period>,
    pub metrics: Vec<MetricReport>,
}

/// Builds [`TrendReport`]s for a fixed set of metrics and entities
///
/// Empty metric or entity lists mean "everything present in the events".
/// Rows are per entity, so events without an entity only count when that
/// entity (the empty string) is configured explicitly; otherwise they are
/// left out of both the rows and the national rollup, with a warning.
pub struct ReportBuilder<C: Clock> {
    clock: C,
    metrics: Vec<String>,
    entities: Vec<String>,
}

impl<C: Clock> ReportBuilder<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            metrics: Vec::new(),
            entities: Vec::new(),
        }
    }

    pub fn with_metrics(mut self, metrics: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.metrics = metrics.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_entities(mut self, entities: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.entities = entities.into_iter().map(Into::into).collect();
        self
    }

    /// Build a report for `token` at the clock's current time
    pub fn build(&self, events: &[Event], token: &str) -> TrendReport {
        self.build_at(events, token, self.clock.now())
    }

    /// Build a report for `token` at an explicit instant
    pub fn build_at(&self, events: &[Event], token: &str, now: NaiveDateTime) -> TrendReport {
        let parsed = token.parse::<PeriodToken>().ok();
        let window = parsed.and_then(|t| t.resolve(now));
        let comparable = parsed.is_some_and(|t| t.supports_comparison());

        let metrics = if self.metrics.is_empty() {
            distinct_metrics(events)
        } else {
            self.metrics.clone()
        };
        let entities = if self.entities.is_empty() {
            let unassigned = events
                .iter()
                .filter(|e| e.entity.is_empty() && metrics.contains(&e.metric))
                .count();
            if unassigned > 0 {
                warn!(
                    unassigned,
                    "Events without an entity are excluded from the report"
                );
            }
            distinct_entities(events)
        } else {
            self.entities.clone()
        };

        let metrics: Vec<MetricReport> = metrics
            .into_iter()
            .map(|metric| {
                let rows: Vec<EntityTrend> = entities
                    .iter()
                    .map(|entity| EntityTrend {
                        entity: entity.clone(),
                        trend: match window {
                            Some(ref period) => calculate_trend(
                                events,
                                &metric,
                                Some(entity.as_str()),
                                Some(period),
                            ),
                            None => TrendResult::no_data(),
                        },
                        comparative: comparable.then(|| {
                            calculate_comparative_trend(
                                events,
                                &metric,
                                Some(entity.as_str()),
                                token,
                                now,
                            )
                        }),
                    })
                    .collect();

                let national = aggregate_trends(rows.iter().map(|r| r.trend));
                let national_comparative = comparable.then(|| {
                    aggregate_comparative_trends(rows.iter().filter_map(|r| r.comparative))
                });

                MetricReport {
                    metric,
                    national,
                    national_comparative,
                    entities: rows,
                }
            })
            .collect();

        info!(
            period = token,
            resolved = window.is_some(),
            metrics = metrics.len(),
            entities = entities.len(),
            events = events.len(),
            "Trend report built"
        );

        TrendReport {
            generated_at: now,
            period: token.to_string(),
            window,
            metrics,
        }
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn clock() -> FixedClock {
        FixedClock(date(2024, 1, 10).and_hms_opt(10, 0, 0).unwrap())
    }

    fn events() -> Vec<Event> {
        vec![
            Event::new(date(2024, 1, 5), "gp", 100.0, "Bihar"),
            Event::new(date(2024, 1, 9), "gp", 120.0, "Bihar"),
            Event::new(date(2024, 1, 5), "gp", 50.0, "Assam"),
            Event::new(date(2024, 1, 8), "gp", 45.0, "Assam"),
            Event::new(date(2024, 1, 8), "km", 7.0, "Assam"),
        ]
    }

    #[test]
    fn test_report_defaults_to_everything_in_feed() {
        let report = ReportBuilder::new(clock()).build(&events(), "current-week");
        assert_eq!(report.metrics.len(), 2);
        assert_eq!(report.metrics[0].metric, "gp");
        assert_eq!(report.metrics[0].entities.len(), 2);
        assert_eq!(report.metrics[0].entities[0].entity, "Assam");

        let gp = &report.metrics[0];
        // Bihar +20, Assam -5
        assert_eq!(gp.national.current_value, 165.0);
        assert_eq!(gp.national.previous_value, 150.0);
        assert_eq!(gp.national.direction, Direction::Up);
        assert!(gp.national_comparative.unwrap().has_data);
        assert_eq!(gp.entities_moving(Direction::Down).count(), 1);
    }

    #[test]
    fn test_report_respects_configured_lists() {
        let report = ReportBuilder::new(clock())
            .with_metrics(["gp"])
            .with_entities(["Bihar"])
            .build(&events(), "today");
        assert_eq!(report.metrics.len(), 1);
        assert_eq!(report.metrics[0].entities.len(), 1);
        assert!(report.metrics[0].national_comparative.is_none());
        // Nothing recorded today
        assert_eq!(report.metrics[0].national.change_value, 0.0);
        assert!(report.metrics[0].national.has_data);
    }

    #[test]
    fn test_unknown_period_propagates_as_no_data() {
        let report = ReportBuilder::new(clock()).build(&events(), "fortnight");
        assert!(report.window.is_none());
        for metric in &report.metrics {
            assert!(!metric.national.has_data);
            assert!(metric.national_comparative.is_none());
            assert!(metric.entities.iter().all(|row| !row.trend.has_data));
        }
    }

    #[test]
    fn test_report_json_keys() {
        let report = ReportBuilder::new(clock())
            .with_metrics(["gp"])
            .build(&events(), "current-month");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["period"], "current-month");
        assert!(json["window"]["startDate"].is_string());
        assert!(json["metrics"][0]["nationalComparative"]["currentDailyRate"].is_number());
    }

    #[test]
    fn test_events_without_entity_are_left_out() {
        let feed = vec![
            Event::new(date(2024, 1, 5), "gp", 100.0, ""),
            Event::new(date(2024, 1, 9), "gp", 120.0, ""),
        ];
        let report = ReportBuilder::new(clock()).build(&feed, "current-week");
        assert_eq!(report.metrics.len(), 1);
        assert!(report.metrics[0].entities.is_empty());
        assert!(!report.metrics[0].national.has_data);

        // An explicit empty entity opts them back in
        let report = ReportBuilder::new(clock())
            .with_entities([""])
            .build(&feed, "current-week");
        assert_eq!(report.metrics[0].entities.len(), 1);
        assert_eq!(report.metrics[0].national.current_value, 120.0);
        assert_eq!(report.metrics[0].national.previous_value, 100.0);
    }
}
