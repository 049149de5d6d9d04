//! Leaf commands built from closures.

use std::time::Duration;

use crate::command::{Command, CommandContext};
use crate::error::CommandFault;
use crate::subsystem::Requirements;

/// Callback run with the command's context.
pub type Action = Box<dyn FnMut(&mut CommandContext<'_>) -> Result<(), CommandFault>>;

/// Read-only predicate over the command's context.
pub type Predicate = Box<dyn Fn(&CommandContext<'_>) -> bool>;

/// Exit callback, told whether the run was interrupted.
pub type EndAction = Box<dyn FnMut(&mut CommandContext<'_>, bool) -> Result<(), CommandFault>>;

// ─── Instant ────────────────────────────────────────────────────────

/// Runs its action in `initialize` and finishes in the same tick.
pub struct InstantCommand {
    name: String,
    requirements: Requirements,
    action: Action,
}

impl InstantCommand {
    pub fn new<F>(name: impl Into<String>, requirements: Requirements, action: F) -> Self
    where
        F: FnMut(&mut CommandContext<'_>) -> Result<(), CommandFault> + 'static,
    {
        Self {
            name: name.into(),
            requirements,
            action: Box::new(action),
        }
    }
}

impl Command for InstantCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> Requirements {
        self.requirements
    }

    fn initialize(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), CommandFault> {
        (self.action)(ctx)
    }

    fn is_finished(&self, _ctx: &CommandContext<'_>) -> bool {
        true
    }
}

// ─── Run ────────────────────────────────────────────────────────────

/// Runs its action every tick until cancelled or interrupted.
pub struct RunCommand {
    name: String,
    requirements: Requirements,
    action: Action,
}

impl RunCommand {
    pub fn new<F>(name: impl Into<String>, requirements: Requirements, action: F) -> Self
    where
        F: FnMut(&mut CommandContext<'_>) -> Result<(), CommandFault> + 'static,
    {
        Self {
            name: name.into(),
            requirements,
            action: Box::new(action),
        }
    }
}

impl Command for RunCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> Requirements {
        self.requirements
    }

    fn execute(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), CommandFault> {
        (self.action)(ctx)
    }
}

// ─── Start / End ────────────────────────────────────────────────────

/// Runs `start` on initialize and `stop` on end; never finishes by itself.
pub struct StartEndCommand {
    name: String,
    requirements: Requirements,
    start: Action,
    stop: Action,
}

impl StartEndCommand {
    pub fn new<S, E>(name: impl Into<String>, requirements: Requirements, start: S, stop: E) -> Self
    where
        S: FnMut(&mut CommandContext<'_>) -> Result<(), CommandFault> + 'static,
        E: FnMut(&mut CommandContext<'_>) -> Result<(), CommandFault> + 'static,
    {
        Self {
            name: name.into(),
            requirements,
            start: Box::new(start),
            stop: Box::new(stop),
        }
    }
}

impl Command for StartEndCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> Requirements {
        self.requirements
    }

    fn initialize(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), CommandFault> {
        (self.start)(ctx)
    }

    fn end(&mut self, ctx: &mut CommandContext<'_>, _interrupted: bool) -> Result<(), CommandFault> {
        (self.stop)(ctx)
    }
}

// ─── Functional ─────────────────────────────────────────────────────

/// Every lifecycle hook supplied as a closure.
pub struct FunctionalCommand {
    name: String,
    requirements: Requirements,
    on_init: Action,
    on_execute: Action,
    on_end: EndAction,
    finished: Predicate,
}

impl FunctionalCommand {
    pub fn new<I, X, E, P>(
        name: impl Into<String>,
        requirements: Requirements,
        on_init: I,
        on_execute: X,
        on_end: E,
        finished: P,
    ) -> Self
    where
        I: FnMut(&mut CommandContext<'_>) -> Result<(), CommandFault> + 'static,
        X: FnMut(&mut CommandContext<'_>) -> Result<(), CommandFault> + 'static,
        E: FnMut(&mut CommandContext<'_>, bool) -> Result<(), CommandFault> + 'static,
        P: Fn(&CommandContext<'_>) -> bool + 'static,
    {
        Self {
            name: name.into(),
            requirements,
            on_init: Box::new(on_init),
            on_execute: Box::new(on_execute),
            on_end: Box::new(on_end),
            finished: Box::new(finished),
        }
    }
}

impl Command for FunctionalCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> Requirements {
        self.requirements
    }

    fn initialize(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), CommandFault> {
        (self.on_init)(ctx)
    }

    fn execute(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), CommandFault> {
        (self.on_execute)(ctx)
    }

    fn is_finished(&self, ctx: &CommandContext<'_>) -> bool {
        (self.finished)(ctx)
    }

    fn end(&mut self, ctx: &mut CommandContext<'_>, interrupted: bool) -> Result<(), CommandFault> {
        (self.on_end)(ctx, interrupted)
    }
}

// ─── Wait ───────────────────────────────────────────────────────────

/// Finishes once `duration` of control time has elapsed.
pub struct WaitCommand {
    name: String,
    duration: Duration,
    started: Duration,
}

impl WaitCommand {
    pub fn new(duration: Duration) -> Self {
        Self {
            name: format!("wait({}ms)", duration.as_millis()),
            duration,
            started: Duration::ZERO,
        }
    }
}

impl Command for WaitCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), CommandFault> {
        self.started = ctx.now();
        Ok(())
    }

    fn is_finished(&self, ctx: &CommandContext<'_>) -> bool {
        ctx.now().saturating_sub(self.started) >= self.duration
    }
}

/// Finishes once `condition` holds.
pub struct WaitUntilCommand {
    name: String,
    condition: Predicate,
}

impl WaitUntilCommand {
    pub fn new<P>(name: impl Into<String>, condition: P) -> Self
    where
        P: Fn(&CommandContext<'_>) -> bool + 'static,
    {
        Self {
            name: name.into(),
            condition: Box::new(condition),
        }
    }
}

impl Command for WaitUntilCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_finished(&self, ctx: &CommandContext<'_>) -> bool {
        (self.condition)(ctx)
    }
}

// ─── Print ──────────────────────────────────────────────────────────

/// Sends one message to the telemetry sink and finishes.
pub struct PrintCommand {
    name: String,
    message: String,
}

impl PrintCommand {
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            name: format!("print({message})"),
            message,
        }
    }
}

impl Command for PrintCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), CommandFault> {
        ctx.report(&self.message);
        Ok(())
    }

    fn is_finished(&self, _ctx: &CommandContext<'_>) -> bool {
        true
    }
}
