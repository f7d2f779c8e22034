//! Serde default value functions
//!
//! Used by `#[serde(default = "...")]` attributes on configuration structs
//! so defaults live in one place.

use rollout_trends::{clock::DEFAULT_UTC_OFFSET, PeriodToken};

/// Default value: false
pub fn bool_false() -> bool {
    false
}

/// Default period: current week
pub fn default_period() -> String {
    PeriodToken::CurrentWeek.as_str().to_string()
}

/// Default wall-clock offset for period boundaries
pub fn default_utc_offset() -> String {
    DEFAULT_UTC_OFFSET.to_string()
}

/// Default feed request timeout: 30 seconds
pub fn feed_timeout_secs() -> u64 {
    30
}

/// Default watch refresh interval: 5 minutes
pub fn feed_refresh_secs() -> u64 {
    300
}

/// Default snapshot staleness window: 5 minutes
pub fn feed_max_age_secs() -> u64 {
    300
}

/// Default log level: info
pub fn log_level() -> String {
    "info".to_string()
}
