//! System-wide constants for the Cadence workspace.
//!
//! Single source of truth for numeric limits and default paths.

use static_assertions::const_assert;

/// Maximum number of subsystems a scheduler can register.
///
/// Requirement sets are stored as a `u64` bitmask, one bit per subsystem.
pub const MAX_SUBSYSTEMS: usize = 64;

/// Default control period in milliseconds (50 Hz).
pub const DEFAULT_PERIOD_MS: u64 = 20;

/// Upper bound accepted for a configured control period.
pub const MAX_PERIOD_MS: u64 = 1000;

/// Default number of scheduler events retained before the oldest are dropped.
pub const DEFAULT_EVENT_LOG_LIMIT: usize = 256;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "config/robot.toml";

const_assert!(MAX_SUBSYSTEMS <= u64::BITS as usize);
const_assert!(DEFAULT_PERIOD_MS > 0 && DEFAULT_PERIOD_MS <= MAX_PERIOD_MS);
