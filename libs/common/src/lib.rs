//! Shared basics for the rollout tools
//!
//! Provides functions shared by the binaries, including:
//! - layered configuration loading
//! - logging setup
//! - shutdown signal handling

pub mod config_loader;
pub mod logging;
pub mod serde_helpers;
pub mod shutdown;

// Re-export commonly used config types at crate root for convenience
pub use config_loader::{load_config, FeedConfig, LoggingConfig, RolloutConfig};
