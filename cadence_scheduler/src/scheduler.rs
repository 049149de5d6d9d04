//! The per-tick command scheduler.
//!
//! ## Tick order
//!
//! ```text
//! advance clock ─▶ subsystem periodic ─▶ poll triggers ─▶ apply requests
//!      ─▶ step runs (execute, is_finished, end) ─▶ apply requests
//!      ─▶ arm default commands
//! ```
//!
//! Requests (from triggers, from commands through their context) are applied
//! strictly in issue order. When a newcomer conflicts with running commands,
//! every conflicting holder must be interruptible; each is then ended with
//! `interrupted = true` before the newcomer's `initialize` runs. Otherwise
//! the newcomer is rejected and never initialized.
//!
//! A fault from any callback is contained at the run: it is ended as
//! interrupted, reported, and the tick continues for everything else.

mod claims;
mod event;

use std::fmt;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::command::{
    Clock, Command, CommandContext, CommandTemplate, InterruptionBehavior, SchedulerRequest,
    TemplateKey,
};
use crate::config::SchedulerConfig;
use crate::error::{CommandFault, CompositionError, SchedulerError};
use crate::subsystem::{Requirements, Subsystem, SubsystemHandle, SubsystemId, SubsystemRegistry};
use crate::telemetry::{Reporter, TracingReporter};
use crate::trigger::Trigger;

use claims::ClaimTable;
use event::EventLog;

pub use event::{EndReason, SchedulerEvent};

/// Upper bound on request-application rounds per phase. Requests issued
/// while applying requests are applied in the next round.
const MAX_REQUEST_ROUNDS: usize = 64;

// ─── Identity & outcomes ────────────────────────────────────────────

/// Identity of one run (one initialize … end lifecycle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunId(pub(crate) u64);

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run#{}", self.0)
    }
}

/// Result of a schedule request.
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleOutcome {
    /// Granted and initialized.
    Scheduled(RunId),
    /// The template's previous run is still active; nothing changed.
    AlreadyRunning(RunId),
    /// A non-interruptible holder blocks one of the requirements.
    Rejected { blocked_by: Vec<String> },
    /// Granted, but `initialize` faulted; the run already ended.
    Faulted { run: RunId, fault: CommandFault },
    /// The template could not compose a run.
    Invalid(CompositionError),
}

impl ScheduleOutcome {
    /// Whether the command is running after the request.
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Scheduled(_) | Self::AlreadyRunning(_))
    }
}

// ─── Internal state ─────────────────────────────────────────────────

struct Run {
    id: RunId,
    key: Option<TemplateKey>,
    name: String,
    requirements: Requirements,
    command: Box<dyn Command>,
}

/// State shared with commands through [`CommandContext`].
struct Resources {
    subsystems: SubsystemRegistry,
    reporter: Box<dyn Reporter>,
    requests: Vec<SchedulerRequest>,
}

impl Resources {
    fn context(&mut self, clock: Clock, claims: Requirements) -> CommandContext<'_> {
        CommandContext::new(
            &mut self.subsystems,
            &mut *self.reporter,
            &mut self.requests,
            clock,
            claims,
        )
    }
}

enum Step {
    Running,
    Done(EndReason),
}

// ─── Scheduler ──────────────────────────────────────────────────────

/// Single coordinator of subsystems, commands and triggers.
///
/// Owns every subsystem; commands reach them only through the context
/// handed to their callbacks.
pub struct Scheduler {
    resources: Resources,
    clock: Clock,
    runs: Vec<Run>,
    claims: ClaimTable,
    defaults: Vec<Option<CommandTemplate>>,
    triggers: Vec<Trigger>,
    events: EventLog,
    next_run: u64,
}

impl Scheduler {
    /// Scheduler with the given period, reporting to `tracing`.
    pub fn new(period: Duration) -> Self {
        Self {
            resources: Resources {
                subsystems: SubsystemRegistry::new(),
                reporter: Box::new(TracingReporter),
                requests: Vec::new(),
            },
            clock: Clock::new(period),
            runs: Vec::new(),
            claims: ClaimTable::new(),
            defaults: Vec::new(),
            triggers: Vec::new(),
            events: EventLog::new(cadence_common::consts::DEFAULT_EVENT_LOG_LIMIT),
            next_run: 0,
        }
    }

    pub fn from_config(config: &SchedulerConfig) -> Self {
        let mut scheduler = Self::new(config.period());
        scheduler.events = EventLog::new(config.event_log_limit);
        scheduler
    }

    /// Replace the telemetry sink.
    pub fn with_reporter(mut self, reporter: impl Reporter + 'static) -> Self {
        self.resources.reporter = Box::new(reporter);
        self
    }

    // ── Registration ──

    /// Register a subsystem and arm its default command, if it has one.
    ///
    /// The default command must require the subsystem.
    pub fn register_subsystem<S: Subsystem>(
        &mut self,
        subsystem: S,
    ) -> Result<SubsystemHandle<S>, SchedulerError> {
        let handle = SubsystemHandle::new(self.resources.subsystems.next_id(subsystem.name())?);
        let default = subsystem.default_command(handle);
        if let Some(template) = &default {
            check_default(subsystem.name(), handle.id(), template)?;
        }

        let name = subsystem.name().to_string();
        let handle = self.resources.subsystems.insert(subsystem)?;
        self.defaults.push(default);
        info!(
            subsystem = %name,
            id = %handle.id(),
            default = ?self.defaults[handle.id().index()].as_ref().map(CommandTemplate::name),
            "Subsystem registered"
        );
        Ok(handle)
    }

    /// Set or replace the default command of a registered subsystem.
    ///
    /// Takes effect the next time the subsystem is unclaimed at the end of a
    /// tick; a running previous default is left alone.
    pub fn set_default_command<S: Subsystem>(
        &mut self,
        handle: SubsystemHandle<S>,
        template: CommandTemplate,
    ) -> Result<(), SchedulerError> {
        let id = handle.id();
        let name = self
            .resources
            .subsystems
            .name(id)
            .ok_or(SchedulerError::UnknownSubsystem(id))?;
        check_default(name, id, &template)?;
        debug!(subsystem = %name, command = %template.name(), "Default command set");
        self.defaults[id.index()] = Some(template);
        Ok(())
    }

    pub fn remove_default_command<S: Subsystem>(
        &mut self,
        handle: SubsystemHandle<S>,
    ) -> Option<CommandTemplate> {
        self.defaults.get_mut(handle.id().index())?.take()
    }

    pub fn default_command<S: Subsystem>(&self, handle: SubsystemHandle<S>) -> Option<&CommandTemplate> {
        self.defaults.get(handle.id().index())?.as_ref()
    }

    /// Triggers are polled in registration order.
    pub fn add_trigger(&mut self, trigger: Trigger) {
        debug!(trigger = %trigger.name(), bindings = trigger.bindings().len(), "Trigger added");
        self.triggers.push(trigger);
    }

    pub fn add_triggers(&mut self, triggers: impl IntoIterator<Item = Trigger>) {
        for trigger in triggers {
            self.add_trigger(trigger);
        }
    }

    // ── Requests ──

    /// Schedule a fresh run of `template`.
    ///
    /// Outside [`run`](Self::run) the request takes effect immediately:
    /// conflicting holders are interrupted and the run is initialized
    /// before this returns.
    pub fn schedule(&mut self, template: &CommandTemplate) -> ScheduleOutcome {
        let outcome = self.schedule_template(template);
        self.apply_requests();
        outcome
    }

    /// Schedule a one-off command with no template identity.
    pub fn schedule_command(&mut self, command: Box<dyn Command>) -> ScheduleOutcome {
        let outcome = self.admit(command, None);
        self.apply_requests();
        outcome
    }

    /// Cancel the active run of `template`. Returns false if none is active.
    pub fn cancel(&mut self, template: &CommandTemplate) -> bool {
        let cancelled = self.cancel_key(template.key());
        self.apply_requests();
        cancelled
    }

    pub fn cancel_run(&mut self, run: RunId) -> bool {
        let cancelled = match self.position(run) {
            Some(index) => {
                let run = self.runs.remove(index);
                self.retire(run, EndReason::Cancelled);
                true
            }
            None => false,
        };
        self.apply_requests();
        cancelled
    }

    /// Cancel every running command, in scheduling order.
    pub fn cancel_all(&mut self) {
        self.cancel_all_runs();
        self.apply_requests();
    }

    // ── Tick ──

    /// Advance one period.
    pub fn run(&mut self) {
        self.clock.advance();
        self.resources.subsystems.periodic_all();
        self.poll_triggers();
        self.apply_requests();
        self.step_runs();
        self.apply_requests();
        self.arm_defaults();
        self.apply_requests();
        self.debug_check_claims();
    }

    // ── Queries ──

    #[inline]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[inline]
    pub fn period(&self) -> Duration {
        self.clock.period
    }

    pub fn is_scheduled(&self, template: &CommandTemplate) -> bool {
        self.run_of(template).is_some()
    }

    /// Active run of `template`, if any.
    pub fn run_of(&self, template: &CommandTemplate) -> Option<RunId> {
        let key = template.key();
        self.runs.iter().find(|r| r.key == Some(key)).map(|r| r.id)
    }

    pub fn is_running(&self, run: RunId) -> bool {
        self.position(run).is_some()
    }

    /// Run currently holding `id`.
    pub fn claimant(&self, id: SubsystemId) -> Option<RunId> {
        self.claims.holder(id)
    }

    /// Name of the command currently holding `id`.
    pub fn claimant_name(&self, id: SubsystemId) -> Option<&str> {
        let run = self.claims.holder(id)?;
        self.runs.iter().find(|r| r.id == run).map(|r| r.name.as_str())
    }

    /// Names of running commands, in scheduling order.
    pub fn running_names(&self) -> Vec<&str> {
        self.runs.iter().map(|r| r.name.as_str()).collect()
    }

    pub fn running_count(&self) -> usize {
        self.runs.len()
    }

    pub fn subsystem<S: Subsystem>(&self, handle: SubsystemHandle<S>) -> Option<&S> {
        self.resources.subsystems.get(handle)
    }

    pub fn subsystems(&self) -> &SubsystemRegistry {
        &self.resources.subsystems
    }

    pub fn events(&self) -> impl Iterator<Item = &SchedulerEvent> {
        self.events.iter()
    }

    /// Drain the event log.
    pub fn take_events(&mut self) -> Vec<SchedulerEvent> {
        self.events.drain()
    }

    /// Events discarded because the log was full.
    pub fn dropped_events(&self) -> u64 {
        self.events.dropped()
    }

    // ── Internals ──

    fn position(&self, run: RunId) -> Option<usize> {
        self.runs.iter().position(|r| r.id == run)
    }

    fn schedule_template(&mut self, template: &CommandTemplate) -> ScheduleOutcome {
        if let Some(run) = self.run_of(template) {
            debug!(command = %template.name(), %run, "Already running");
            return ScheduleOutcome::AlreadyRunning(run);
        }
        match template.instantiate() {
            Ok(command) => self.admit(command, Some(template.key())),
            Err(err) => {
                warn!(command = %template.name(), error = %err, "Invalid command composition");
                self.resources
                    .reporter
                    .report(&format!("{} invalid: {err}", template.name()));
                self.events.push(SchedulerEvent::Invalid {
                    tick: self.clock.tick,
                    name: template.name().to_string(),
                    error: err.clone(),
                });
                ScheduleOutcome::Invalid(err)
            }
        }
    }

    /// Resolve conflicts, grant claims, initialize.
    fn admit(&mut self, mut command: Box<dyn Command>, key: Option<TemplateKey>) -> ScheduleOutcome {
        let name = command.name().to_string();
        let requirements = command.requirements();
        let holders = self.claims.holders(requirements);

        let blocked_by: Vec<String> = self
            .runs
            .iter()
            .filter(|r| holders.contains(&r.id))
            .filter(|r| r.command.interruption_behavior() == InterruptionBehavior::CancelIncoming)
            .map(|r| r.name.clone())
            .collect();
        if !blocked_by.is_empty() {
            warn!(
                command = %name,
                blocked_by = ?blocked_by,
                subsystems = %self.resources.subsystems.describe(requirements),
                "Schedule rejected: holder is not interruptible"
            );
            self.resources
                .reporter
                .report(&format!("{name} rejected by {}", blocked_by.join(", ")));
            self.events.push(SchedulerEvent::Rejected {
                tick: self.clock.tick,
                name,
                blocked_by: blocked_by.clone(),
            });
            return ScheduleOutcome::Rejected { blocked_by };
        }

        for holder in holders {
            if let Some(index) = self.position(holder) {
                let run = self.runs.remove(index);
                self.retire(run, EndReason::Interrupted { by: name.clone() });
            }
        }

        let id = RunId(self.next_run);
        self.next_run += 1;
        self.claims.grant(requirements, id);

        let result = {
            let mut ctx = self.resources.context(self.clock, requirements);
            command.initialize(&mut ctx)
        };
        let run = Run {
            id,
            key,
            name,
            requirements,
            command,
        };
        match result {
            Ok(()) => {
                debug!(command = %run.name, %id, tick = self.clock.tick, "Command initialized");
                self.resources
                    .reporter
                    .report(&format!("{} initialized", run.name));
                self.events.push(SchedulerEvent::Initialized {
                    tick: self.clock.tick,
                    run: id,
                    name: run.name.clone(),
                });
                self.runs.push(run);
                ScheduleOutcome::Scheduled(id)
            }
            Err(fault) => {
                self.retire(run, EndReason::Faulted(fault.clone()));
                ScheduleOutcome::Faulted { run: id, fault }
            }
        }
    }

    /// Call `end`, release claims, record the transition.
    fn retire(&mut self, mut run: Run, reason: EndReason) {
        let result = {
            let mut ctx = self.resources.context(self.clock, run.requirements);
            run.command.end(&mut ctx, reason.is_interrupted())
        };
        let reason = match (result, reason) {
            (Ok(()), reason) => reason,
            (Err(late), EndReason::Faulted(first)) => {
                error!(command = %run.name, fault = %late, "Fault in end after earlier fault");
                EndReason::Faulted(first)
            }
            (Err(fault), _) => EndReason::Faulted(fault),
        };
        self.claims.release(run.id);

        match &reason {
            EndReason::Faulted(fault) => {
                error!(command = %run.name, run = %run.id, fault = %fault, "Command faulted")
            }
            EndReason::TimedOut => info!(command = %run.name, run = %run.id, "Command timed out"),
            other => debug!(command = %run.name, run = %run.id, reason = %other, "Command ended"),
        }
        self.resources
            .reporter
            .report(&format!("{} {reason}", run.name));
        self.events.push(SchedulerEvent::Ended {
            tick: self.clock.tick,
            run: run.id,
            name: run.name,
            reason,
        });
    }

    fn cancel_key(&mut self, key: TemplateKey) -> bool {
        match self.runs.iter().position(|r| r.key == Some(key)) {
            Some(index) => {
                let run = self.runs.remove(index);
                self.retire(run, EndReason::Cancelled);
                true
            }
            None => false,
        }
    }

    fn cancel_all_runs(&mut self) {
        let runs = std::mem::take(&mut self.runs);
        if !runs.is_empty() {
            info!(count = runs.len(), "Cancelling all commands");
        }
        for run in runs {
            self.retire(run, EndReason::Cancelled);
        }
    }

    fn poll_triggers(&mut self) {
        let Self {
            triggers,
            resources,
            ..
        } = self;
        for trigger in triggers.iter_mut() {
            trigger.poll(&resources.subsystems, &mut resources.requests);
        }
    }

    /// Apply queued requests in issue order.
    fn apply_requests(&mut self) {
        for _ in 0..MAX_REQUEST_ROUNDS {
            if self.resources.requests.is_empty() {
                return;
            }
            let batch = std::mem::take(&mut self.resources.requests);
            for request in batch {
                match request {
                    SchedulerRequest::Schedule(template) => {
                        self.schedule_template(&template);
                    }
                    SchedulerRequest::Cancel(template) => {
                        self.cancel_key(template.key());
                    }
                    SchedulerRequest::Toggle(template) => {
                        if !self.cancel_key(template.key()) {
                            self.schedule_template(&template);
                        }
                    }
                    SchedulerRequest::CancelAll => self.cancel_all_runs(),
                }
            }
        }
        if !self.resources.requests.is_empty() {
            warn!(
                dropped = self.resources.requests.len(),
                rounds = MAX_REQUEST_ROUNDS,
                "Request cascade limit reached, dropping remaining requests"
            );
            self.resources.requests.clear();
        }
    }

    /// Step every run once, in scheduling order.
    fn step_runs(&mut self) {
        let mut index = 0;
        while index < self.runs.len() {
            let step = {
                let run = &mut self.runs[index];
                let mut ctx = self.resources.context(self.clock, run.requirements);
                match run.command.execute(&mut ctx) {
                    Err(fault) => Step::Done(EndReason::Faulted(fault)),
                    Ok(()) if run.command.is_finished(&ctx) => {
                        if run.command.timed_out() {
                            Step::Done(EndReason::TimedOut)
                        } else {
                            Step::Done(EndReason::Finished)
                        }
                    }
                    Ok(()) => Step::Running,
                }
            };
            match step {
                Step::Running => index += 1,
                Step::Done(reason) => {
                    let run = self.runs.remove(index);
                    self.retire(run, reason);
                }
            }
        }
    }

    /// Schedule the default of every unclaimed subsystem, in registration
    /// order.
    fn arm_defaults(&mut self) {
        for id in self.resources.subsystems.ids() {
            if self.claims.holder(id).is_some() {
                continue;
            }
            let Some(template) = self.defaults[id.index()].clone() else {
                continue;
            };
            let outcome = self.schedule_template(&template);
            if !outcome.is_running() {
                debug!(subsystem = %id, command = %template.name(), ?outcome, "Default command not armed");
            }
        }
    }

    fn debug_check_claims(&self) {
        if cfg!(debug_assertions) {
            for run in &self.runs {
                debug_assert_eq!(
                    self.claims.held_by(run.id),
                    run.requirements,
                    "claim table out of sync for {}",
                    run.name
                );
            }
        }
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("clock", &self.clock)
            .field("subsystems", &self.resources.subsystems)
            .field("running", &self.running_names())
            .field("triggers", &self.triggers.len())
            .finish()
    }
}

/// A default command must claim the subsystem it serves.
fn check_default(
    subsystem: &str,
    id: SubsystemId,
    template: &CommandTemplate,
) -> Result<(), SchedulerError> {
    let command = template.instantiate()?;
    if !command.requirements().requires(id) {
        return Err(SchedulerError::DefaultCommandMissingRequirement {
            subsystem: subsystem.to_string(),
            command: template.name().to_string(),
        });
    }
    Ok(())
}

// ─── Tests ──────────────────────────────────────────────────────────
