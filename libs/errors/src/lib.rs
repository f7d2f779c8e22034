//! Unified error handling for the rollout monitoring tools
//!
//! The trend engine itself never fails; this error type covers everything
//! around it: configuration, reading and fetching the event feed, parsing
//! and command-line validation.

use thiserror::Error;

// ============================================================================
// RolloutError - Main error type
// ============================================================================

/// Main error type for everything outside the calculation core
#[derive(Debug, Error)]
pub enum RolloutError {
    // ======================================
    // Configuration Errors
    // ======================================
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid configuration: {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("Missing required configuration: {0}")]
    MissingConfig(String),

    // ======================================
    // Feed Errors
    // ======================================
    #[error("Feed request failed: {url}: HTTP {status}")]
    FeedStatus { url: String, status: u16 },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    // ======================================
    // Validation Errors
    // ======================================
    #[error("Invalid parameter: {param}: {reason}")]
    InvalidParameter { param: String, reason: String },

    #[error(transparent)]
    Trend(#[from] rollout_trends::TrendError),

    // ======================================
    // File & I/O Errors
    // ======================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Parse error: {file}: {error}")]
    ParseError { file: String, error: String },

    // ======================================
    // Runtime Errors
    // ======================================
    #[error("Runtime error: {0}")]
    Runtime(String),
}

/// Result type alias using RolloutError
pub type RolloutResult<T> = Result<T, RolloutError>;

impl RolloutError {
    pub fn invalid_parameter(param: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            reason: reason.into(),
        }
    }

    pub fn parse_error(file: impl Into<String>, error: impl ToString) -> Self {
        Self::ParseError {
            file: file.into(),
            error: error.to_string(),
        }
    }
}

// Layered config extraction failures
impl From<figment::Error> for RolloutError {
    fn from(err: figment::Error) -> Self {
        Self::Configuration(err.to_string())
    }
}

// Helper macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::RolloutError::Configuration($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::RolloutError::Configuration(format!($fmt, $($arg)*))
    };
}

// ============================================================================
// RolloutError implements RolloutErrorTrait
// ============================================================================

impl RolloutErrorTrait for RolloutError {
    fn error_code(&self) -> &'static str {
        match self {
            // Configuration Errors
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::InvalidConfig { .. } => "INVALID_CONFIG",
            Self::MissingConfig(_) => "MISSING_CONFIG",

            // Feed Errors
            Self::FeedStatus { .. } => "FEED_STATUS",
            Self::HttpClient(_) => "HTTP_CLIENT_ERROR",

            // Validation
            Self::InvalidParameter { .. } => "INVALID_PARAMETER",
            Self::Trend(_) => "INVALID_TREND_INPUT",

            // File & I/O
            Self::Io(_) => "IO_ERROR",
            Self::FileNotFound(_) => "FILE_NOT_FOUND",
            Self::ParseError { .. } => "PARSE_ERROR",

            // Runtime
            Self::Runtime(_) => "RUNTIME_ERROR",
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration(_) | Self::InvalidConfig { .. } | Self::MissingConfig(_) => {
                ErrorCategory::Configuration
            },

            // 5xx and throttling are transient; other statuses need a config fix
            Self::FeedStatus { status, .. } => match *status {
                404 => ErrorCategory::NotFound,
                429 | 500..=599 => ErrorCategory::Network,
                _ => ErrorCategory::Configuration,
            },

            Self::HttpClient(e) => {
                if e.is_timeout() {
                    ErrorCategory::Timeout
                } else if e.is_decode() {
                    ErrorCategory::Validation
                } else {
                    ErrorCategory::Network
                }
            },

            Self::InvalidParameter { .. } | Self::Trend(_) | Self::ParseError { .. } => {
                ErrorCategory::Validation
            },

            Self::FileNotFound(_) => ErrorCategory::NotFound,

            Self::Io(_) | Self::Runtime(_) => ErrorCategory::Internal,
        }
    }
}

// ============================================================================
// Error Trait - Architectural layer
// ============================================================================

/// Error category enum - used for classification and retry decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Timeout,
    Validation,
    NotFound,
    Internal,
}

/// Shared error capability trait
///
/// Error types used by the tools implement this to get uniform codes,
/// categories and retry hints.
pub trait RolloutErrorTrait: std::error::Error + Send + Sync + 'static {
    /// Get error code (for logs and JSON output)
    fn error_code(&self) -> &'static str;

    /// Get error category
    fn category(&self) -> ErrorCategory;

    /// Whether the error is retryable (default implementation is category-based)
    fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Network | ErrorCategory::Timeout
        )
    }

    /// Recommended retry delay in milliseconds
    fn retry_delay_ms(&self) -> u64 {
        match self.category() {
            ErrorCategory::Network => 1000,
            ErrorCategory::Timeout => 500,
            _ => 0,
        }
    }

    /// Maximum retry attempts
    fn max_retries(&self) -> u32 {
        if self.is_retryable() {
            3
        } else {
            0
        }
    }
}
