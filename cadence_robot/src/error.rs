//! Errors raised while building or running the robot.

use cadence_common::config::ConfigError;
use cadence_scheduler::cycle::CycleError;
use cadence_scheduler::error::{BindingError, CompositionError, SchedulerError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RobotError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("subsystem registration failed: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("invalid binding table: {0}")]
    Binding(#[from] BindingError),

    #[error("invalid command composition: {0}")]
    Composition(#[from] CompositionError),

    #[error(transparent)]
    Cycle(#[from] CycleError),

    #[error("unknown input `{0}`")]
    UnknownInput(String),
}
