//! Configuration loading for the rollout tools
//!
//! Priority (highest to lowest):
//! 1. Environment variables prefixed with `ROLLOUT_` (`__` separates nesting)
//! 2. Explicit config file passed by the caller
//! 3. `config/trendctl.{toml,yaml,json}` when present
//! 4. Built-in defaults

use std::path::Path;

use errors::{config_error, RolloutError, RolloutResult};
use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use rollout_trends::{parse_utc_offset, PeriodToken};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::serde_helpers;

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "ROLLOUT_";

/// Bearer token for the event feed; read from the environment only
pub const ENV_FEED_TOKEN: &str = "ROLLOUT_FEED_TOKEN";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RolloutConfig {
    /// Metrics included in reports (empty = all metrics in the feed)
    #[serde(default)]
    pub metrics: Vec<String>,

    /// Entities rolled up into national totals (empty = all entities in the feed)
    #[serde(default)]
    pub entities: Vec<String>,

    /// Period used when a command does not name one
    #[serde(default = "serde_helpers::default_period")]
    pub default_period: String,

    /// Wall-clock offset for period boundaries, e.g. `+05:30`
    #[serde(default = "serde_helpers::default_utc_offset")]
    pub utc_offset: String,

    #[serde(default)]
    pub feed: FeedConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for RolloutConfig {
    fn default() -> Self {
        Self {
            metrics: Vec::new(),
            entities: Vec::new(),
            default_period: serde_helpers::default_period(),
            utc_offset: serde_helpers::default_utc_offset(),
            feed: FeedConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Event feed settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// File path or `http(s)://` URL of the `{ "events": [...] }` document
    #[serde(default)]
    pub source: Option<String>,

    #[serde(default = "serde_helpers::feed_timeout_secs")]
    pub timeout_secs: u64,

    /// Watch-mode refetch interval
    #[serde(default = "serde_helpers::feed_refresh_secs")]
    pub refresh_secs: u64,

    /// Age after which a snapshot is considered stale
    #[serde(default = "serde_helpers::feed_max_age_secs")]
    pub max_age_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            source: None,
            timeout_secs: serde_helpers::feed_timeout_secs(),
            refresh_secs: serde_helpers::feed_refresh_secs(),
            max_age_secs: serde_helpers::feed_max_age_secs(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "serde_helpers::log_level")]
    pub level: String,

    /// Emit JSON lines instead of the bracketed text format
    #[serde(default = "serde_helpers::bool_false")]
    pub json: bool,

    /// Directory for daily log files; console only when unset
    #[serde(default)]
    pub dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: serde_helpers::log_level(),
            json: false,
            dir: None,
        }
    }
}

impl RolloutConfig {
    /// Check values the type system cannot
    pub fn validate(&self) -> RolloutResult<()> {
        self.default_period
            .parse::<PeriodToken>()
            .map_err(|e| RolloutError::InvalidConfig {
                field: "default_period".to_string(),
                reason: e.to_string(),
            })?;
        parse_utc_offset(&self.utc_offset).map_err(|e| RolloutError::InvalidConfig {
            field: "utc_offset".to_string(),
            reason: e.to_string(),
        })?;
        if self.feed.timeout_secs == 0 {
            return Err(RolloutError::InvalidConfig {
                field: "feed.timeout_secs".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.feed.refresh_secs == 0 {
            return Err(RolloutError::InvalidConfig {
                field: "feed.refresh_secs".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        if let Some(blank) = self.entities.iter().find(|e| e.trim().is_empty()) {
            return Err(RolloutError::InvalidConfig {
                field: "entities".to_string(),
                reason: format!("blank entity name '{}'", blank),
            });
        }
        Ok(())
    }
}

/// Base figment: defaults, then the conventional config files
pub fn base_figment() -> Figment {
    Figment::from(Serialized::defaults(RolloutConfig::default()))
        .merge(Toml::file("config/trendctl.toml"))
        .merge(Yaml::file("config/trendctl.yaml"))
        .merge(Json::file("config/trendctl.json"))
}

/// Merge one explicit file by extension
pub fn with_file(figment: Figment, path: &Path) -> RolloutResult<Figment> {
    if !path.exists() {
        return Err(RolloutError::FileNotFound(path.display().to_string()));
    }
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| config_error!("Config file must have an extension"))?;

    let figment = match extension {
        "toml" => figment.merge(Toml::file(path)),
        "yaml" | "yml" => figment.merge(Yaml::file(path)),
        "json" => figment.merge(Json::file(path)),
        _ => {
            return Err(config_error!(
                "Unsupported config file format: {}",
                extension
            ))
        },
    };
    Ok(figment)
}

/// Load and validate the configuration
pub fn load_config(path: Option<&Path>) -> RolloutResult<RolloutConfig> {
    let mut figment = base_figment();
    if let Some(path) = path {
        info!("Loading configuration from {}", path.display());
        figment = with_file(figment, path)?;
    }
    let config = extract(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))?;
    debug!(?config, "Configuration loaded");
    Ok(config)
}

/// Extract and validate a fully layered figment
pub fn extract(figment: Figment) -> RolloutResult<RolloutConfig> {
    let config: RolloutConfig = figment.extract()?;
    config.validate()?;
    Ok(config)
}

/// Feed bearer token, if set
pub fn feed_token() -> Option<String> {
    std::env::var(ENV_FEED_TOKEN)
        .ok()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}
