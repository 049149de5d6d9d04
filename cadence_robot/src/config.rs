//! Robot configuration file: the scheduler sections plus an optional
//! input script for simulation runs.
//!
//! ```toml
//! [shared]
//! service_name = "cadence-robot"
//!
//! [[script]]
//! tick = 50
//! input = "operator.amp"
//! value = true
//!
//! [[script]]
//! tick = 60
//! input = "driver.left_y"
//! value = -0.5
//! ```

use cadence_common::config::ConfigError;
use cadence_scheduler::config::RobotConfig;
use serde::{Deserialize, Serialize};

/// Value written to an input by a script step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    Button(bool),
    Axis(f64),
}

/// Set `input` to `value` before tick `tick` runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptStep {
    pub tick: u64,
    pub input: String,
    pub value: InputValue,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(flatten)]
    pub robot: RobotConfig,
    #[serde(default)]
    pub script: Vec<ScriptStep>,
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.robot.validate()?;
        for step in &self.script {
            if step.input.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "script step at tick {} has an empty input",
                    step.tick
                )));
            }
            if let InputValue::Axis(value) = step.value {
                if !(-1.0..=1.0).contains(&value) {
                    return Err(ConfigError::ValidationError(format!(
                        "script value {value} for `{}` is outside -1.0..=1.0",
                        step.input
                    )));
                }
            }
        }
        Ok(())
    }
}
