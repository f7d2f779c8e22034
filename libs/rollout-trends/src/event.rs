//! Event model - timestamped cumulative observations
//!
//! Events come from a spreadsheet-backed feed shaped as `{ "events": [...] }`.
//! Dates are day-granularity; values are absolute counters, not deltas.
//! Feed rows are decoded into [`FeedRecord`]s first and turned into
//! [`Event`]s against the wall-clock offset used for period boundaries.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

use crate::error::{Result, TrendError};

/// A single observation of one metric for one entity
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Local calendar date of the observation
    #[serde(rename = "timestamp")]
    pub date: NaiveDate,
    /// Metric identifier (e.g. `hotoGPsDone`)
    #[serde(rename = "metricName")]
    pub metric: String,
    /// Cumulative counter value, always finite
    pub value: f64,
    /// Owning region
    pub entity: String,
}

impl Event {
    pub fn new(
        date: NaiveDate,
        metric: impl Into<String>,
        value: f64,
        entity: impl Into<String>,
    ) -> Self {
        Self {
            date,
            metric: metric.into(),
            value,
            entity: entity.into(),
        }
    }

    /// Local midnight of the observation date
    pub fn instant(&self) -> NaiveDateTime {
        self.date.and_time(NaiveTime::MIN)
    }

    /// Whether this event belongs to `metric` (and `entity`, when given)
    pub fn matches(&self, metric: &str, entity: Option<&str>) -> bool {
        self.metric == metric && entity.map_or(true, |e| self.entity == e)
    }
}

/// One feed row as it arrives on the wire
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FeedRecord {
    pub timestamp: String,
    #[serde(rename = "metricName")]
    pub metric: String,
    /// `None` for a blank or null cell
    #[serde(default, deserialize_with = "deserialize_counter")]
    pub value: Option<f64>,
    #[serde(default)]
    pub entity: String,
}

/// Feed payload wrapper
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventFeed {
    #[serde(default)]
    pub events: Vec<FeedRecord>,
}

impl EventFeed {
    /// Convert rows into events, dating offset-carrying stamps in `offset`
    ///
    /// Rows with a blank value are skipped rather than read as zero. A bad
    /// timestamp fails the whole feed.
    pub fn into_events(self, offset: FixedOffset) -> Result<Vec<Event>> {
        let total = self.events.len();
        let mut events = Vec::with_capacity(total);
        for record in self.events {
            let Some(value) = record.value else {
                continue;
            };
            events.push(Event {
                date: parse_event_date(&record.timestamp, offset)?,
                metric: record.metric,
                value,
                entity: record.entity,
            });
        }
        if events.len() < total {
            warn!(
                skipped = total - events.len(),
                total,
                "Feed rows without a value were skipped"
            );
        }
        Ok(events)
    }
}

/// Entities present in the feed, sorted and de-duplicated
///
/// Events without an entity are not listed.
pub fn distinct_entities(events: &[Event]) -> Vec<String> {
    events
        .iter()
        .filter(|e| !e.entity.is_empty())
        .map(|e| e.entity.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Metric names present in the feed, sorted and de-duplicated
pub fn distinct_metrics(events: &[Event]) -> Vec<String> {
    events
        .iter()
        .map(|e| e.metric.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Parse a feed timestamp into a local calendar date
///
/// Accepts `YYYY-MM-DD`, RFC 3339 (`2024-01-08T10:00:00+05:30`) and naive
/// date-times (`2024-01-08T10:00:00`, `2024-01-08 10:00:00`). RFC 3339
/// stamps are converted into `offset` before the date is taken; naive ones
/// are already local.
pub fn parse_event_date(raw: &str, offset: FixedOffset) -> Result<NaiveDate> {
    let s = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&offset).date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }
    Err(TrendError::invalid_timestamp(raw))
}

/// Number, numeric string (`"1,234"` included), blank or null
///
/// Non-finite values are rejected.
fn deserialize_counter<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        String(String),
    }

    let value = match Option::<NumberOrString>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(NumberOrString::Number(n)) => n,
        Some(NumberOrString::String(s)) => {
            let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
            if cleaned.is_empty() {
                return Ok(None);
            }
            cleaned
                .parse::<f64>()
                .map_err(|e| D::Error::custom(format!("Invalid numeric value '{}': {}", s, e)))?
        },
    };
    if !value.is_finite() {
        return Err(D::Error::custom(format!(
            "Counter value must be finite, got {}",
            value
        )));
    }
    Ok(Some(value))
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    fn ist() -> FixedOffset {
        FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap()
    }

    fn decode(json: &str) -> Result<Vec<Event>> {
        serde_json::from_str::<EventFeed>(json)
            .unwrap()
            .into_events(ist())
    }

    #[test]
    fn test_parse_event_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        assert_eq!(parse_event_date("2024-01-08", ist()).unwrap(), expected);
        assert_eq!(
            parse_event_date("2024-01-08T22:10:00+05:30", ist()).unwrap(),
            expected
        );
        assert_eq!(
            parse_event_date("2024-01-08T10:00:00", ist()).unwrap(),
            expected
        );
        assert_eq!(
            parse_event_date(" 2024-01-08 10:00:00.5 ", ist()).unwrap(),
            expected
        );
        assert!(parse_event_date("08/01/2024", ist()).is_err());
    }

    #[test]
    fn test_offset_stamps_dated_in_local_zone() {
        // 20:00Z on Saturday is 01:30 on Sunday at +05:30
        let sunday = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
        assert_eq!(
            parse_event_date("2024-01-06T20:00:00Z", ist()).unwrap(),
            sunday
        );
        assert_eq!(
            parse_event_date("2024-01-06T18:29:59.999Z", ist()).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 6).unwrap()
        );
        assert_eq!(
            parse_event_date("2024-01-06T18:30:00Z", ist()).unwrap(),
            sunday
        );
        let utc = FixedOffset::east_opt(0).unwrap();
        assert_eq!(
            parse_event_date("2024-01-06T20:00:00Z", utc).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 6).unwrap()
        );
    }

    #[test]
    fn test_feed_decode() {
        let events = decode(
            r#"{
            "events": [
                {"timestamp": "2024-01-01", "metricName": "hotoGPsDone", "value": 10, "entity": "Bihar"},
                {"timestamp": "2024-01-08T09:30:00Z", "metricName": "hotoGPsDone", "value": "1,025", "entity": "Bihar"},
                {"timestamp": "2024-01-09", "metricName": "surveyKm", "value": 3.5}
            ]
        }"#,
        )
        .unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[1].value, 1025.0);
        assert_eq!(events[2].entity, "");
        assert_eq!(events[1].date, NaiveDate::from_ymd_opt(2024, 1, 8).unwrap());
    }

    #[test]
    fn test_feed_rejects_bad_value() {
        let json = r#"{"events": [{"timestamp": "2024-01-01", "metricName": "x", "value": "n/a"}]}"#;
        assert!(serde_json::from_str::<EventFeed>(json).is_err());
    }

    #[test]
    fn test_feed_rejects_non_finite_values() {
        for bad in ["NaN", "inf", "-infinity", "Infinity"] {
            let json = format!(
                r#"{{"events": [{{"timestamp": "2024-01-08", "metricName": "x", "value": "{}"}}]}}"#,
                bad
            );
            assert!(
                serde_json::from_str::<EventFeed>(&json).is_err(),
                "accepted {}",
                bad
            );
        }
    }

    #[test]
    fn test_blank_values_are_skipped_not_zero() {
        let events = decode(
            r#"{"events": [
                {"timestamp": "2024-01-01", "metricName": "x", "value": 500, "entity": "A"},
                {"timestamp": "2024-01-08", "metricName": "x", "value": "  ", "entity": "A"},
                {"timestamp": "2024-01-09", "metricName": "x", "value": null, "entity": "A"},
                {"timestamp": "2024-01-10", "metricName": "x", "entity": "A"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].value, 500.0);
    }

    #[test]
    fn test_bad_timestamp_fails_feed() {
        let result = decode(
            r#"{"events": [{"timestamp": "last tuesday", "metricName": "x", "value": 1}]}"#,
        );
        assert!(matches!(result, Err(TrendError::InvalidTimestamp(_))));
    }

    #[test]
    fn test_matches_and_distinct() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let events = vec![
            Event::new(d, "x", 1.0, "B"),
            Event::new(d, "y", 1.0, "A"),
            Event::new(d, "x", 2.0, "A"),
            Event::new(d, "x", 3.0, ""),
        ];
        assert!(events[0].matches("x", None));
        assert!(events[0].matches("x", Some("B")));
        assert!(!events[0].matches("x", Some("A")));
        assert_eq!(distinct_entities(&events), vec!["A", "B"]);
        assert_eq!(distinct_metrics(&events), vec!["x", "y"]);
    }
}
