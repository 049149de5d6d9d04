//! Operator inputs: named buttons, stick axes and the scripted input
//! player that drives them in simulation.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use cadence_scheduler::trigger::{InputMap, Signal};
use tracing::debug;

use crate::config::{InputValue, ScriptStep};
use crate::error::RobotError;

/// Shared analog input in `-1.0..=1.0`.
#[derive(Clone, Default)]
pub struct Axis(Rc<Cell<f64>>);

impl Axis {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, value: f64) {
        self.0.set(value.clamp(-1.0, 1.0));
    }

    pub fn get(&self) -> f64 {
        self.0.get()
    }
}

impl fmt::Debug for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Axis").field(&self.get()).finish()
    }
}

// ─── Input names ────────────────────────────────────────────────────

pub const DRIVER_BUTTONS: [&str; 5] = [
    "driver.a",
    "driver.x",
    "driver.start",
    "driver.left_bumper",
    "driver.right_bumper",
];

pub const OPERATOR_BUTTONS: [&str; 5] = [
    "operator.trigger",
    "operator.intake",
    "operator.eject",
    "operator.amp",
    "operator.zero",
];

/// Beam-break line of the intake, written by the simulation script.
pub const NOTE_SENSOR: &str = "sensor.note";

pub const DRIVER_AXES: [&str; 3] = ["driver.left_y", "driver.left_x", "driver.right_x"];

/// Every input the robot exposes to bindings and scripts.
#[derive(Debug, Clone)]
pub struct OperatorIo {
    buttons: InputMap,
    axes: Vec<(String, Axis)>,
}

impl OperatorIo {
    pub fn new() -> Self {
        let mut buttons = InputMap::new();
        for name in DRIVER_BUTTONS.iter().chain(&OPERATOR_BUTTONS) {
            buttons.insert(*name, Signal::new());
        }
        buttons.insert(NOTE_SENSOR, Signal::new());
        let axes = DRIVER_AXES
            .iter()
            .map(|name| (name.to_string(), Axis::new()))
            .collect();
        Self { buttons, axes }
    }

    pub fn buttons(&self) -> &InputMap {
        &self.buttons
    }

    pub fn button(&self, name: &str) -> Result<Signal, RobotError> {
        self.buttons
            .get(name)
            .cloned()
            .ok_or_else(|| RobotError::UnknownInput(name.to_string()))
    }

    pub fn axis(&self, name: &str) -> Result<Axis, RobotError> {
        self.axes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, a)| a.clone())
            .ok_or_else(|| RobotError::UnknownInput(name.to_string()))
    }

    pub fn apply(&self, step: &ScriptStep) -> Result<(), RobotError> {
        match step.value {
            InputValue::Button(pressed) => self.button(&step.input)?.set(pressed),
            InputValue::Axis(value) => self.axis(&step.input)?.set(value),
        }
        debug!(tick = step.tick, input = %step.input, value = ?step.value, "Scripted input");
        Ok(())
    }
}

impl Default for OperatorIo {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Script ─────────────────────────────────────────────────────────

/// Replays scripted input changes at their ticks.
#[derive(Debug, Clone, Default)]
pub struct ScriptPlayer {
    steps: Vec<ScriptStep>,
    next: usize,
}

impl ScriptPlayer {
    /// Steps are ordered by tick; steps on the same tick keep file order.
    pub fn new(mut steps: Vec<ScriptStep>) -> Self {
        steps.sort_by_key(|s| s.tick);
        Self { steps, next: 0 }
    }

    /// Check every step names a known input.
    pub fn check(&self, io: &OperatorIo) -> Result<(), RobotError> {
        for step in &self.steps {
            match step.value {
                InputValue::Button(_) => io.button(&step.input).map(drop)?,
                InputValue::Axis(_) => io.axis(&step.input).map(drop)?,
            }
        }
        Ok(())
    }

    /// Apply every pending step due at or before `tick`.
    pub fn play(&mut self, tick: u64, io: &OperatorIo) -> Result<usize, RobotError> {
        let start = self.next;
        while let Some(step) = self.steps.get(self.next) {
            if step.tick > tick {
                break;
            }
            io.apply(step)?;
            self.next += 1;
        }
        Ok(self.next - start)
    }

    pub fn is_done(&self) -> bool {
        self.next >= self.steps.len()
    }
}
