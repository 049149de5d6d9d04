//! Scheduler configuration: control period, overrun policy and the binding
//! table.
//!
//! ```toml
//! [shared]
//! service_name = "cadence-robot"
//! log_level = "info"
//!
//! [scheduler]
//! period_ms = 20
//! overrun_policy = "warn"
//! event_log_limit = 128
//!
//! [[bindings]]
//! input = "operator.a"
//! on = "on_true"
//! command = "arm.amp"
//! ```

use std::time::Duration;

use cadence_common::config::{ConfigError, SharedConfig};
use cadence_common::consts::{DEFAULT_EVENT_LOG_LIMIT, DEFAULT_PERIOD_MS, MAX_PERIOD_MS};
use serde::{Deserialize, Serialize};

// ─── Scheduler ──────────────────────────────────────────────────────

/// What the cycle runner does when a tick takes longer than the period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverrunPolicy {
    /// Log and keep going.
    #[default]
    Warn,
    /// Stop the cycle with an error.
    Abort,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub period_ms: u64,
    pub overrun_policy: OverrunPolicy,
    /// Scheduler events retained before the oldest are dropped.
    pub event_log_limit: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            period_ms: DEFAULT_PERIOD_MS,
            overrun_policy: OverrunPolicy::default(),
            event_log_limit: DEFAULT_EVENT_LOG_LIMIT,
        }
    }
}

impl SchedulerConfig {
    #[inline]
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_PERIOD_MS).contains(&self.period_ms) {
            return Err(ConfigError::ValidationError(format!(
                "period_ms must be in 1..={MAX_PERIOD_MS}, got {}",
                self.period_ms
            )));
        }
        if !(1..=DEFAULT_EVENT_LOG_LIMIT).contains(&self.event_log_limit) {
            return Err(ConfigError::ValidationError(format!(
                "event_log_limit must be in 1..={DEFAULT_EVENT_LOG_LIMIT}, got {}",
                self.event_log_limit
            )));
        }
        Ok(())
    }
}

// ─── Bindings ───────────────────────────────────────────────────────

/// Edge/action pair of a binding row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingKind {
    OnTrue,
    OnFalse,
    WhileTrue,
    WhileFalse,
    ToggleOnTrue,
    CancelOnTrue,
    /// Cancel every running command on the rising edge. Takes no command.
    CancelAllOnTrue,
}

impl BindingKind {
    #[inline]
    pub fn needs_command(self) -> bool {
        self != Self::CancelAllOnTrue
    }
}

/// One row of the binding table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingConfig {
    pub input: String,
    pub on: BindingKind,
    #[serde(default)]
    pub command: Option<String>,
}

impl BindingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "binding input cannot be empty".to_string(),
            ));
        }
        match (&self.command, self.on.needs_command()) {
            (None, true) => Err(ConfigError::ValidationError(format!(
                "binding on `{}` ({:?}) needs a command",
                self.input, self.on
            ))),
            (Some(name), _) if name.trim().is_empty() => Err(ConfigError::ValidationError(
                format!("binding on `{}` has an empty command name", self.input),
            )),
            _ => Ok(()),
        }
    }
}

// ─── Robot ──────────────────────────────────────────────────────────

/// Complete robot configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RobotConfig {
    #[serde(default)]
    pub shared: SharedConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub bindings: Vec<BindingConfig>,
}

impl RobotConfig {
    /// Validate every section, stopping at the first error.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.scheduler.validate()?;
        self.bindings.iter().try_for_each(BindingConfig::validate)
    }
}
