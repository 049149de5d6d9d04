//! Per-callback view of the scheduler handed to commands.

use std::time::Duration;

use crate::command::CommandTemplate;
use crate::error::CommandFault;
use crate::subsystem::{Requirements, Subsystem, SubsystemHandle, SubsystemRegistry};
use crate::telemetry::Reporter;

/// Scheduler time at the current tick.
///
/// `now` is simulated control time (`tick * period`), so command timing is
/// deterministic regardless of wall-clock jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clock {
    pub tick: u64,
    pub now: Duration,
    pub period: Duration,
}

impl Clock {
    pub const fn new(period: Duration) -> Self {
        Self {
            tick: 0,
            now: Duration::ZERO,
            period,
        }
    }

    pub(crate) fn advance(&mut self) {
        self.tick += 1;
        self.now += self.period;
    }
}

/// Request issued from inside a tick, applied by the scheduler in issue order.
#[derive(Clone)]
pub enum SchedulerRequest {
    Schedule(CommandTemplate),
    Cancel(CommandTemplate),
    /// Cancel if running when applied, schedule otherwise.
    Toggle(CommandTemplate),
    CancelAll,
}

impl std::fmt::Debug for SchedulerRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Schedule(t) => write!(f, "Schedule({})", t.name()),
            Self::Cancel(t) => write!(f, "Cancel({})", t.name()),
            Self::Toggle(t) => write!(f, "Toggle({})", t.name()),
            Self::CancelAll => f.write_str("CancelAll"),
        }
    }
}

/// Access granted to a command while one of its callbacks runs.
///
/// Mutable subsystem access is limited to the claims of the running command.
pub struct CommandContext<'a> {
    subsystems: &'a mut SubsystemRegistry,
    reporter: &'a mut dyn Reporter,
    requests: &'a mut Vec<SchedulerRequest>,
    clock: Clock,
    claims: Requirements,
}

impl<'a> CommandContext<'a> {
    pub(crate) fn new(
        subsystems: &'a mut SubsystemRegistry,
        reporter: &'a mut dyn Reporter,
        requests: &'a mut Vec<SchedulerRequest>,
        clock: Clock,
        claims: Requirements,
    ) -> Self {
        Self {
            subsystems,
            reporter,
            requests,
            clock,
            claims,
        }
    }

    #[inline]
    pub fn tick(&self) -> u64 {
        self.clock.tick
    }

    #[inline]
    pub fn now(&self) -> Duration {
        self.clock.now
    }

    #[inline]
    pub fn period(&self) -> Duration {
        self.clock.period
    }

    /// Subsystems this run holds the claim on.
    #[inline]
    pub fn claims(&self) -> Requirements {
        self.claims
    }

    /// Read-only access to any subsystem.
    pub fn subsystem<S: Subsystem>(&self, handle: SubsystemHandle<S>) -> Result<&S, CommandFault> {
        self.subsystems
            .get(handle)
            .ok_or(CommandFault::UnknownSubsystem(handle.id()))
    }

    /// Mutable access, only for subsystems this run has claimed.
    pub fn subsystem_mut<S: Subsystem>(
        &mut self,
        handle: SubsystemHandle<S>,
    ) -> Result<&mut S, CommandFault> {
        if !self.claims.requires(handle.id()) {
            return Err(CommandFault::NotClaimed(handle.id()));
        }
        self.subsystems
            .get_mut(handle)
            .ok_or(CommandFault::UnknownSubsystem(handle.id()))
    }

    pub fn subsystems(&self) -> &SubsystemRegistry {
        self.subsystems
    }

    /// Fire-and-forget status message to the telemetry sink.
    pub fn report(&mut self, message: &str) {
        self.reporter.report(message);
    }

    pub fn schedule(&mut self, template: &CommandTemplate) {
        self.requests
            .push(SchedulerRequest::Schedule(template.clone()));
    }

    pub fn cancel(&mut self, template: &CommandTemplate) {
        self.requests.push(SchedulerRequest::Cancel(template.clone()));
    }

    pub fn cancel_all(&mut self) {
        self.requests.push(SchedulerRequest::CancelAll);
    }
}
