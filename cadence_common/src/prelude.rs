//! Prelude module for common re-exports.
//!
//! ```rust
//! use cadence_common::prelude::*;
//!
//! assert_eq!(DEFAULT_PERIOD.as_millis(), 20);
//! ```

use std::time::Duration;

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, SharedConfig};
pub use crate::consts::DEFAULT_CONFIG_PATH;

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{DEFAULT_EVENT_LOG_LIMIT, DEFAULT_PERIOD_MS, MAX_PERIOD_MS, MAX_SUBSYSTEMS};

/// Default control period as Duration.
pub const DEFAULT_PERIOD: Duration = Duration::from_millis(DEFAULT_PERIOD_MS);
