//! Shared fixtures: a lifecycle-recording command and a goal-state
//! mechanism.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use cadence_scheduler::prelude::*;

pub const PERIOD: Duration = Duration::from_millis(20);

/// Lifecycle trace shared between probes, e.g. `"A:init@0"`.
#[derive(Clone, Default)]
pub struct Trace(Rc<RefCell<Vec<String>>>);

impl Trace {
    pub fn push(&self, entry: String) {
        self.0.borrow_mut().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    /// Entries of one command, without the command prefix.
    pub fn of(&self, name: &str) -> Vec<String> {
        let prefix = format!("{name}:");
        self.0
            .borrow()
            .iter()
            .filter_map(|e| e.strip_prefix(&prefix).map(str::to_string))
            .collect()
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.0.borrow().iter().position(|e| e == entry)
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Execute,
    End,
}

/// Command that records every callback and finishes after a fixed number
/// of executes.
pub struct Probe {
    name: String,
    requirements: Requirements,
    finish_after: Option<u32>,
    executed: u32,
    fault_in: Option<Phase>,
    trace: Trace,
}

impl Probe {
    pub fn new(name: &str, trace: &Trace) -> Self {
        Self {
            name: name.to_string(),
            requirements: Requirements::empty(),
            finish_after: None,
            executed: 0,
            fault_in: None,
            trace: trace.clone(),
        }
    }

    pub fn requiring(mut self, requirements: impl Into<Requirements>) -> Self {
        self.requirements = requirements.into();
        self
    }

    pub fn finishing_after(mut self, executes: u32) -> Self {
        self.finish_after = Some(executes);
        self
    }

    pub fn faulting_in(mut self, phase: Phase) -> Self {
        self.fault_in = Some(phase);
        self
    }

    fn record(&self, what: &str, tick: u64) {
        self.trace.push(format!("{}:{what}@{tick}", self.name));
    }

    fn check(&self, phase: Phase) -> Result<(), CommandFault> {
        if self.fault_in == Some(phase) {
            return Err(CommandFault::failed(format!("{} broke in {phase:?}", self.name)));
        }
        Ok(())
    }
}

impl Command for Probe {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> Requirements {
        self.requirements
    }

    fn initialize(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), CommandFault> {
        self.executed = 0;
        self.record("init", ctx.tick());
        self.check(Phase::Init)
    }

    fn execute(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), CommandFault> {
        self.executed += 1;
        self.record("exec", ctx.tick());
        self.check(Phase::Execute)
    }

    fn is_finished(&self, _ctx: &CommandContext<'_>) -> bool {
        self.finish_after.is_some_and(|n| self.executed >= n)
    }

    fn end(&mut self, ctx: &mut CommandContext<'_>, interrupted: bool) -> Result<(), CommandFault> {
        self.record(if interrupted { "interrupted" } else { "end" }, ctx.tick());
        self.check(Phase::End)
    }
}

/// Template over a probe builder.
pub fn probe<F>(name: &str, trace: &Trace, configure: F) -> CommandTemplate
where
    F: Fn(Probe) -> Probe + 'static,
{
    let trace = trace.clone();
    let probe_name = name.to_string();
    CommandTemplate::new(name, move || configure(Probe::new(&probe_name, &trace)))
}

/// Linear mechanism that moves one unit toward its goal every tick.
pub struct Mechanism {
    name: &'static str,
    goal: i32,
    position: i32,
}

impl Mechanism {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            goal: 0,
            position: 0,
        }
    }

    pub fn position(&self) -> i32 {
        self.position
    }
}

impl Subsystem for Mechanism {
    fn name(&self) -> &str {
        self.name
    }

    fn periodic(&mut self) {
        self.position += (self.goal - self.position).signum();
    }

    fn reached_goal(&self) -> bool {
        self.position == self.goal
    }
}

impl GoalSubsystem for Mechanism {
    type Goal = i32;

    fn goal(&self) -> i32 {
        self.goal
    }

    fn set_goal(&mut self, goal: i32) {
        self.goal = goal;
    }
}

pub fn scheduler() -> (Scheduler, MemoryReporter) {
    let reporter = MemoryReporter::default();
    (Scheduler::new(PERIOD).with_reporter(reporter.clone()), reporter)
}

/// Tick and reason of the first `Ended` event for `name`.
pub fn ended(events: &[SchedulerEvent], name: &str) -> Option<(u64, EndReason)> {
    events.iter().find_map(|e| match e {
        SchedulerEvent::Ended {
            tick,
            name: n,
            reason,
            ..
        } if n == name => Some((*tick, reason.clone())),
        _ => None,
    })
}

pub fn run_ticks(scheduler: &mut Scheduler, ticks: u32) {
    for _ in 0..ticks {
        scheduler.run();
    }
}
