//! Period Resolver - relative period tokens to concrete local intervals
//!
//! Every period is a closed interval `[start, end]` where `end` is the last
//! millisecond covered. Weeks start on Sunday. All boundaries are derived
//! from an explicit `now`; nothing here reads the system clock.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TrendError;

/// Relative period selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PeriodToken {
    Today,
    CurrentWeek,
    LastWeek,
    CurrentMonth,
    LastMonth,
}

impl PeriodToken {
    pub const ALL: [PeriodToken; 5] = [
        Self::Today,
        Self::CurrentWeek,
        Self::LastWeek,
        Self::CurrentMonth,
        Self::LastMonth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::CurrentWeek => "current-week",
            Self::LastWeek => "last-week",
            Self::CurrentMonth => "current-month",
            Self::LastMonth => "last-month",
        }
    }

    /// Whether period-over-period comparison is defined for this token
    pub fn supports_comparison(&self) -> bool {
        matches!(self, Self::CurrentWeek | Self::CurrentMonth)
    }

    /// Resolve to a concrete interval anchored at `now`
    ///
    /// Returns `None` only when the calendar arithmetic leaves chrono's
    /// representable range.
    pub fn resolve(&self, now: NaiveDateTime) -> Option<Period> {
        let today = now.date();
        match self {
            Self::Today => Some(Period::new(start_of_day(today), end_of_day(today)?)),
            Self::CurrentWeek => Some(Period::new(
                start_of_day(week_start(today)?),
                end_of_day(today)?,
            )),
            Self::LastWeek => preceding_week(start_of_day(week_start(today)?)),
            Self::CurrentMonth => Some(Period::new(
                start_of_day(today.with_day(1)?),
                end_of_day(today)?,
            )),
            Self::LastMonth => preceding_month(today.with_day(1)?),
        }
    }
}

impl fmt::Display for PeriodToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PeriodToken {
    type Err = TrendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "today" => Ok(Self::Today),
            "current-week" => Ok(Self::CurrentWeek),
            "last-week" => Ok(Self::LastWeek),
            "current-month" => Ok(Self::CurrentMonth),
            "last-month" => Ok(Self::LastMonth),
            other => Err(TrendError::unknown_period(other)),
        }
    }
}

/// Concrete closed interval in local wall-clock time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    #[serde(rename = "startDate")]
    pub start: NaiveDateTime,
    #[serde(rename = "endDate")]
    pub end: NaiveDateTime,
}

impl Period {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Period spanning whole calendar days `first..=last`
    pub fn from_dates(first: NaiveDate, last: NaiveDate) -> Option<Self> {
        Some(Self::new(start_of_day(first), end_of_day(last)?))
    }

    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// Number of calendar days touched by the interval
    pub fn days(&self) -> i64 {
        (self.end.date() - self.start.date()).num_days() + 1
    }
}

/// Resolve a token string at `now`; unknown tokens yield `None`
pub fn resolve_period(token: &str, now: NaiveDateTime) -> Option<Period> {
    token.parse::<PeriodToken>().ok()?.resolve(now)
}

/// The period immediately before the current one, of the same length class
///
/// `current-week` maps to the 7 days ending 1ms before this week's start;
/// `current-month` maps to the whole preceding calendar month. Other tokens
/// have no comparable predecessor.
pub fn previous_comparable(token: PeriodToken, now: NaiveDateTime) -> Option<Period> {
    let current = token.resolve(now)?;
    match token {
        PeriodToken::CurrentWeek => preceding_week(current.start),
        PeriodToken::CurrentMonth => preceding_month(current.start.date()),
        _ => None,
    }
}

fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

fn end_of_day(date: NaiveDate) -> Option<NaiveDateTime> {
    start_of_day(date.succ_opt()?).checked_sub_signed(Duration::milliseconds(1))
}

/// Sunday on or before `date`
fn week_start(date: NaiveDate) -> Option<NaiveDate> {
    date.checked_sub_signed(Duration::days(i64::from(
        date.weekday().num_days_from_sunday(),
    )))
}

/// The 7 days ending 1ms before `week_start`
fn preceding_week(week_start: NaiveDateTime) -> Option<Period> {
    let end = week_start.checked_sub_signed(Duration::milliseconds(1))?;
    let first = end.date().checked_sub_signed(Duration::days(6))?;
    Some(Period::new(start_of_day(first), end))
}

/// The calendar month before the one starting at `month_start`
fn preceding_month(month_start: NaiveDate) -> Option<Period> {
    let last = month_start.pred_opt()?;
    Period::from_dates(last.with_day(1)?, last)
}
