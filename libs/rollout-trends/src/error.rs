//! Error types for rollout-trends
//!
//! The calculators never fail; these errors only cover parsing of
//! caller-supplied tokens and settings.

use thiserror::Error;

/// Parsing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrendError {
    #[error("Unknown period token: {0}")]
    UnknownPeriod(String),

    #[error("Invalid UTC offset: {0}")]
    InvalidOffset(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

impl TrendError {
    pub fn unknown_period(token: impl Into<String>) -> Self {
        Self::UnknownPeriod(token.into())
    }

    pub fn invalid_offset(msg: impl Into<String>) -> Self {
        Self::InvalidOffset(msg.into())
    }

    pub fn invalid_timestamp(msg: impl Into<String>) -> Self {
        Self::InvalidTimestamp(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, TrendError>;
