//! Commands: schedulable units of control logic.
//!
//! ## Lifecycle
//!
//! ```text
//! Idle ──grant──▶ Initialized ──▶ Running ──▶ Ended(natural | interrupted)
//! ```
//!
//! - `initialize` runs exactly once, in the tick the scheduler grants the
//!   claims. It must reset all per-run state.
//! - `execute` runs once per tick while running; `is_finished` is checked
//!   right after it.
//! - `end` runs exactly once, told whether the end was interrupted.
//!
//! Composites own their children (`Vec<Box<dyn Command>>`) and compute their
//! requirement set once, at construction.

pub mod basic;
pub mod context;
pub mod decorator;
pub mod goal;
pub mod group;
pub mod template;

use std::time::Duration;

pub use context::{Clock, CommandContext, SchedulerRequest};
pub use template::{CommandCatalog, CommandTemplate, TemplateKey};

use crate::error::{CommandFault, CompositionError};
use crate::subsystem::Requirements;

use decorator::{FinallyDo, Named, Repeat, Timeout, Until, WithInterruptBehavior};
use group::{Deadline, Parallel, Race, Sequence};

/// What happens when a new command wants a subsystem this one holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterruptionBehavior {
    /// The running command is interrupted and the newcomer is granted.
    #[default]
    CancelSelf,
    /// The newcomer is rejected; this command keeps running.
    CancelIncoming,
}

/// A unit of work with an explicit lifecycle and declared requirements.
pub trait Command {
    fn name(&self) -> &str;

    /// Subsystems this command needs exclusively. Must not change over time.
    fn requirements(&self) -> Requirements {
        Requirements::empty()
    }

    fn interruption_behavior(&self) -> InterruptionBehavior {
        InterruptionBehavior::CancelSelf
    }

    fn initialize(&mut self, _ctx: &mut CommandContext<'_>) -> Result<(), CommandFault> {
        Ok(())
    }

    fn execute(&mut self, _ctx: &mut CommandContext<'_>) -> Result<(), CommandFault> {
        Ok(())
    }

    /// Completion predicate, evaluated after every `execute`.
    fn is_finished(&self, _ctx: &CommandContext<'_>) -> bool {
        false
    }

    fn end(&mut self, _ctx: &mut CommandContext<'_>, _interrupted: bool) -> Result<(), CommandFault> {
        Ok(())
    }

    /// True when the last positive `is_finished` came from a deadline
    /// expiring. The scheduler then ends the run as interrupted.
    fn timed_out(&self) -> bool {
        false
    }
}

impl<C: Command + ?Sized> Command for Box<C> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn requirements(&self) -> Requirements {
        (**self).requirements()
    }

    fn interruption_behavior(&self) -> InterruptionBehavior {
        (**self).interruption_behavior()
    }

    fn initialize(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), CommandFault> {
        (**self).initialize(ctx)
    }

    fn execute(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), CommandFault> {
        (**self).execute(ctx)
    }

    fn is_finished(&self, ctx: &CommandContext<'_>) -> bool {
        (**self).is_finished(ctx)
    }

    fn end(&mut self, ctx: &mut CommandContext<'_>, interrupted: bool) -> Result<(), CommandFault> {
        (**self).end(ctx, interrupted)
    }

    fn timed_out(&self) -> bool {
        (**self).timed_out()
    }
}

/// Composition sugar available on every command.
pub trait CommandExt: Command + Sized + 'static {
    fn boxed(self) -> Box<dyn Command> {
        Box::new(self)
    }

    /// Interrupt the command if it has not finished within `timeout`.
    fn with_timeout(self, timeout: Duration) -> Timeout {
        Timeout::new(self, timeout)
    }

    /// Also finish once `condition` holds.
    fn until<F>(self, condition: F) -> Until
    where
        F: Fn(&CommandContext<'_>) -> bool + 'static,
    {
        Until::new(self, condition)
    }

    /// Run `next` after this command ends naturally.
    fn and_then<C: Command + 'static>(self, next: C) -> Sequence {
        Sequence::pair(self.boxed(), next.boxed())
    }

    /// Run `first` before this command.
    fn before_starting<C: Command + 'static>(self, first: C) -> Sequence {
        Sequence::pair(first.boxed(), self.boxed())
    }

    fn along_with<C: Command + 'static>(self, other: C) -> Result<Parallel, CompositionError> {
        Parallel::new(vec![self.boxed(), other.boxed()])
    }

    fn race_with<C: Command + 'static>(self, other: C) -> Result<Race, CompositionError> {
        Race::new(vec![self.boxed(), other.boxed()])
    }

    /// Run `other` alongside this command, stopping it when this one ends.
    fn deadline_with<C: Command + 'static>(self, other: C) -> Result<Deadline, CompositionError> {
        Deadline::new(self.boxed(), vec![other.boxed()])
    }

    /// Run `hook` after the command ends, with the interrupted flag.
    fn finally_do<F>(self, hook: F) -> FinallyDo
    where
        F: FnMut(&mut CommandContext<'_>, bool) -> Result<(), CommandFault> + 'static,
    {
        FinallyDo::new(self, hook)
    }

    fn with_interrupt_behavior(self, behavior: InterruptionBehavior) -> WithInterruptBehavior {
        WithInterruptBehavior::new(self, behavior)
    }

    /// Reject incoming commands that need this command's subsystems.
    fn non_interruptible(self) -> WithInterruptBehavior {
        self.with_interrupt_behavior(InterruptionBehavior::CancelIncoming)
    }

    /// Restart the command each time it ends naturally. Never finishes.
    fn repeatedly(self) -> Repeat {
        Repeat::new(self)
    }

    fn with_name(self, name: impl Into<String>) -> Named {
        Named::new(self, name)
    }
}

impl<C: Command + Sized + 'static> CommandExt for C {}

/// Union of the requirements of `children`.
pub(crate) fn union_requirements(children: &[Box<dyn Command>]) -> Requirements {
    children
        .iter()
        .fold(Requirements::empty(), |acc, c| acc | c.requirements())
}

/// `CancelIncoming` if any child is.
pub(crate) fn combined_behavior(children: &[Box<dyn Command>]) -> InterruptionBehavior {
    if children
        .iter()
        .any(|c| c.interruption_behavior() == InterruptionBehavior::CancelIncoming)
    {
        InterruptionBehavior::CancelIncoming
    } else {
        InterruptionBehavior::CancelSelf
    }
}
