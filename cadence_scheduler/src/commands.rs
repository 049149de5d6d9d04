//! Factory functions for common commands and groups.
//!
//! ```rust
//! use std::time::Duration;
//! use cadence_scheduler::commands;
//! use cadence_scheduler::command::CommandExt;
//!
//! let routine = commands::print("auto started")
//!     .and_then(commands::wait(Duration::from_millis(500)))
//!     .and_then(commands::print("auto finished"));
//! ```

use std::time::Duration;

use crate::command::basic::{
    FunctionalCommand, InstantCommand, PrintCommand, RunCommand, StartEndCommand, WaitCommand,
    WaitUntilCommand,
};
use crate::command::group::{Deadline, Parallel, Race, Sequence};
use crate::command::{Command, CommandContext};
use crate::error::{CommandFault, CompositionError};
use crate::subsystem::Requirements;

pub use crate::command::goal::{go_to, SetGoal, WaitForGoal};

/// One-shot action: runs in initialize, ends in the same tick.
pub fn run_once<F>(name: impl Into<String>, requirements: Requirements, action: F) -> InstantCommand
where
    F: FnMut(&mut CommandContext<'_>) -> Result<(), CommandFault> + 'static,
{
    InstantCommand::new(name, requirements, action)
}

/// Runs `action` every tick; never finishes by itself.
pub fn run<F>(name: impl Into<String>, requirements: Requirements, action: F) -> RunCommand
where
    F: FnMut(&mut CommandContext<'_>) -> Result<(), CommandFault> + 'static,
{
    RunCommand::new(name, requirements, action)
}

pub fn start_end<S, E>(
    name: impl Into<String>,
    requirements: Requirements,
    start: S,
    stop: E,
) -> StartEndCommand
where
    S: FnMut(&mut CommandContext<'_>) -> Result<(), CommandFault> + 'static,
    E: FnMut(&mut CommandContext<'_>) -> Result<(), CommandFault> + 'static,
{
    StartEndCommand::new(name, requirements, start, stop)
}

pub fn functional<I, X, E, P>(
    name: impl Into<String>,
    requirements: Requirements,
    on_init: I,
    on_execute: X,
    on_end: E,
    finished: P,
) -> FunctionalCommand
where
    I: FnMut(&mut CommandContext<'_>) -> Result<(), CommandFault> + 'static,
    X: FnMut(&mut CommandContext<'_>) -> Result<(), CommandFault> + 'static,
    E: FnMut(&mut CommandContext<'_>, bool) -> Result<(), CommandFault> + 'static,
    P: Fn(&CommandContext<'_>) -> bool + 'static,
{
    FunctionalCommand::new(name, requirements, on_init, on_execute, on_end, finished)
}

pub fn wait(duration: Duration) -> WaitCommand {
    WaitCommand::new(duration)
}

pub fn wait_until<P>(name: impl Into<String>, condition: P) -> WaitUntilCommand
where
    P: Fn(&CommandContext<'_>) -> bool + 'static,
{
    WaitUntilCommand::new(name, condition)
}

pub fn print(message: impl Into<String>) -> PrintCommand {
    PrintCommand::new(message)
}

/// Does nothing and finishes immediately.
pub fn none() -> InstantCommand {
    InstantCommand::new("none", Requirements::empty(), |_| Ok(()))
}

/// Holds `requirements` and does nothing until interrupted.
pub fn idle(name: impl Into<String>, requirements: Requirements) -> RunCommand {
    RunCommand::new(name, requirements, |_| Ok(()))
}

pub fn sequence(children: Vec<Box<dyn Command>>) -> Result<Sequence, CompositionError> {
    Sequence::new(children)
}

pub fn parallel(children: Vec<Box<dyn Command>>) -> Result<Parallel, CompositionError> {
    Parallel::new(children)
}

pub fn race(children: Vec<Box<dyn Command>>) -> Result<Race, CompositionError> {
    Race::new(children)
}

pub fn deadline(
    leader: Box<dyn Command>,
    others: Vec<Box<dyn Command>>,
) -> Result<Deadline, CompositionError> {
    Deadline::new(leader, others)
}
