//! Single-child decorators.

use std::time::Duration;

use crate::command::basic::{EndAction, Predicate};
use crate::command::{Command, CommandContext, CommandExt, InterruptionBehavior};
use crate::error::CommandFault;
use crate::subsystem::Requirements;

// ─── Timeout ────────────────────────────────────────────────────────

/// Forces an interrupted end if the inner command has not finished within
/// `timeout` of control time.
///
/// The inner command always sees `interrupted = true` when the deadline
/// expires, whether this decorator runs at top level or inside a group.
pub struct Timeout {
    name: String,
    inner: Box<dyn Command>,
    timeout: Duration,
    started: Duration,
    expired: bool,
}

impl Timeout {
    pub fn new<C: Command + 'static>(inner: C, timeout: Duration) -> Self {
        Self {
            name: format!("{}.with_timeout({}ms)", inner.name(), timeout.as_millis()),
            inner: inner.boxed(),
            timeout,
            started: Duration::ZERO,
            expired: false,
        }
    }
}

impl Command for Timeout {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> Requirements {
        self.inner.requirements()
    }

    fn interruption_behavior(&self) -> InterruptionBehavior {
        self.inner.interruption_behavior()
    }

    fn initialize(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), CommandFault> {
        self.started = ctx.now();
        self.expired = false;
        self.inner.initialize(ctx)
    }

    fn execute(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), CommandFault> {
        self.inner.execute(ctx)?;
        if !self.inner.is_finished(ctx) {
            self.expired = ctx.now().saturating_sub(self.started) >= self.timeout;
        }
        Ok(())
    }

    fn is_finished(&self, ctx: &CommandContext<'_>) -> bool {
        self.expired || self.inner.is_finished(ctx)
    }

    fn end(&mut self, ctx: &mut CommandContext<'_>, interrupted: bool) -> Result<(), CommandFault> {
        self.inner.end(ctx, interrupted || self.expired)
    }

    fn timed_out(&self) -> bool {
        self.expired
    }
}

// ─── Until ──────────────────────────────────────────────────────────

/// ORs an external predicate into the inner completion condition.
///
/// When the predicate ends the run first, the inner command is ended as
/// interrupted.
pub struct Until {
    name: String,
    inner: Box<dyn Command>,
    condition: Predicate,
    inner_done: bool,
}

impl Until {
    pub fn new<C, F>(inner: C, condition: F) -> Self
    where
        C: Command + 'static,
        F: Fn(&CommandContext<'_>) -> bool + 'static,
    {
        Self {
            name: format!("{}.until(..)", inner.name()),
            inner: inner.boxed(),
            condition: Box::new(condition),
            inner_done: false,
        }
    }
}

impl Command for Until {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> Requirements {
        self.inner.requirements()
    }

    fn interruption_behavior(&self) -> InterruptionBehavior {
        self.inner.interruption_behavior()
    }

    fn initialize(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), CommandFault> {
        self.inner_done = false;
        self.inner.initialize(ctx)
    }

    fn execute(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), CommandFault> {
        self.inner.execute(ctx)?;
        self.inner_done = self.inner.is_finished(ctx);
        Ok(())
    }

    fn is_finished(&self, ctx: &CommandContext<'_>) -> bool {
        self.inner_done || (self.condition)(ctx)
    }

    fn end(&mut self, ctx: &mut CommandContext<'_>, interrupted: bool) -> Result<(), CommandFault> {
        self.inner.end(ctx, interrupted || !self.inner_done)
    }

    fn timed_out(&self) -> bool {
        self.inner.timed_out()
    }
}

// ─── Finally ────────────────────────────────────────────────────────

/// Runs a hook after the inner command's exit action.
pub struct FinallyDo {
    name: String,
    inner: Box<dyn Command>,
    hook: EndAction,
}

impl FinallyDo {
    pub fn new<C, F>(inner: C, hook: F) -> Self
    where
        C: Command + 'static,
        F: FnMut(&mut CommandContext<'_>, bool) -> Result<(), CommandFault> + 'static,
    {
        Self {
            name: inner.name().to_string(),
            inner: inner.boxed(),
            hook: Box::new(hook),
        }
    }
}

impl Command for FinallyDo {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> Requirements {
        self.inner.requirements()
    }

    fn interruption_behavior(&self) -> InterruptionBehavior {
        self.inner.interruption_behavior()
    }

    fn initialize(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), CommandFault> {
        self.inner.initialize(ctx)
    }

    fn execute(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), CommandFault> {
        self.inner.execute(ctx)
    }

    fn is_finished(&self, ctx: &CommandContext<'_>) -> bool {
        self.inner.is_finished(ctx)
    }

    fn end(&mut self, ctx: &mut CommandContext<'_>, interrupted: bool) -> Result<(), CommandFault> {
        let inner = self.inner.end(ctx, interrupted);
        let hook = (self.hook)(ctx, interrupted || self.inner.timed_out());
        inner.and(hook)
    }

    fn timed_out(&self) -> bool {
        self.inner.timed_out()
    }
}

// ─── Interruption behaviour ─────────────────────────────────────────

/// Overrides the inner command's interruption behaviour.
pub struct WithInterruptBehavior {
    inner: Box<dyn Command>,
    behavior: InterruptionBehavior,
}

impl WithInterruptBehavior {
    pub fn new<C: Command + 'static>(inner: C, behavior: InterruptionBehavior) -> Self {
        Self {
            inner: inner.boxed(),
            behavior,
        }
    }
}

impl Command for WithInterruptBehavior {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn requirements(&self) -> Requirements {
        self.inner.requirements()
    }

    fn interruption_behavior(&self) -> InterruptionBehavior {
        self.behavior
    }

    fn initialize(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), CommandFault> {
        self.inner.initialize(ctx)
    }

    fn execute(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), CommandFault> {
        self.inner.execute(ctx)
    }

    fn is_finished(&self, ctx: &CommandContext<'_>) -> bool {
        self.inner.is_finished(ctx)
    }

    fn end(&mut self, ctx: &mut CommandContext<'_>, interrupted: bool) -> Result<(), CommandFault> {
        self.inner.end(ctx, interrupted)
    }

    fn timed_out(&self) -> bool {
        self.inner.timed_out()
    }
}

// ─── Repeat ─────────────────────────────────────────────────────────

/// Re-initialises the inner command on the tick after each natural end.
pub struct Repeat {
    name: String,
    inner: Box<dyn Command>,
    active: bool,
}

impl Repeat {
    pub fn new<C: Command + 'static>(inner: C) -> Self {
        Self {
            name: format!("{}.repeatedly()", inner.name()),
            inner: inner.boxed(),
            active: false,
        }
    }
}

impl Command for Repeat {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> Requirements {
        self.inner.requirements()
    }

    fn interruption_behavior(&self) -> InterruptionBehavior {
        self.inner.interruption_behavior()
    }

    fn initialize(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), CommandFault> {
        self.active = true;
        self.inner.initialize(ctx)
    }

    fn execute(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), CommandFault> {
        if !self.active {
            self.active = true;
            self.inner.initialize(ctx)?;
        }
        self.inner.execute(ctx)?;
        if self.inner.is_finished(ctx) {
            self.active = false;
            self.inner.end(ctx, false)?;
        }
        Ok(())
    }

    fn end(&mut self, ctx: &mut CommandContext<'_>, interrupted: bool) -> Result<(), CommandFault> {
        if std::mem::take(&mut self.active) {
            self.inner.end(ctx, interrupted)?;
        }
        Ok(())
    }
}

// ─── Named ──────────────────────────────────────────────────────────

/// Replaces the inner command's name in logs and events.
pub struct Named {
    name: String,
    inner: Box<dyn Command>,
}

impl Named {
    pub fn new<C: Command + 'static>(inner: C, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inner: inner.boxed(),
        }
    }
}

impl Command for Named {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> Requirements {
        self.inner.requirements()
    }

    fn interruption_behavior(&self) -> InterruptionBehavior {
        self.inner.interruption_behavior()
    }

    fn initialize(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), CommandFault> {
        self.inner.initialize(ctx)
    }

    fn execute(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), CommandFault> {
        self.inner.execute(ctx)
    }

    fn is_finished(&self, ctx: &CommandContext<'_>) -> bool {
        self.inner.is_finished(ctx)
    }

    fn end(&mut self, ctx: &mut CommandContext<'_>, interrupted: bool) -> Result<(), CommandFault> {
        self.inner.end(ctx, interrupted)
    }

    fn timed_out(&self) -> bool {
        self.inner.timed_out()
    }
}
