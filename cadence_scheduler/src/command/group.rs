//! Command groups: sequence, parallel-all, parallel-race, deadline.
//!
//! Groups own their children. Requirements and interruption behaviour are
//! computed once here and never change afterwards. Concurrent groups reject
//! members with overlapping requirements.

use crate::command::{combined_behavior, union_requirements, Command, CommandContext, InterruptionBehavior};
use crate::error::{CommandFault, CompositionError, GroupKind};
use crate::subsystem::Requirements;

fn group_name(kind: GroupKind, children: &[Box<dyn Command>]) -> String {
    let names: Vec<&str> = children.iter().map(|c| c.name()).collect();
    format!("{kind}({})", names.join(", "))
}

fn check_not_empty(kind: GroupKind, children: &[Box<dyn Command>]) -> Result<(), CompositionError> {
    if children.is_empty() {
        return Err(CompositionError::EmptyGroup { kind });
    }
    Ok(())
}

fn check_disjoint(kind: GroupKind, children: &[Box<dyn Command>]) -> Result<(), CompositionError> {
    let mut seen = Requirements::empty();
    for (i, child) in children.iter().enumerate() {
        let reqs = child.requirements();
        if seen.intersects(reqs) {
            let first = children[..i]
                .iter()
                .find(|c| c.requirements().intersects(reqs))
                .map(|c| c.name().to_string())
                .unwrap_or_default();
            return Err(CompositionError::OverlappingRequirements {
                kind,
                first,
                second: child.name().to_string(),
            });
        }
        seen |= reqs;
    }
    Ok(())
}

/// End every child still marked running as interrupted.
///
/// All of them are ended even if one faults; the first fault is returned.
fn interrupt_running(
    children: &mut [Box<dyn Command>],
    running: &mut [bool],
    ctx: &mut CommandContext<'_>,
) -> Result<(), CommandFault> {
    let mut first_fault = None;
    for (child, running) in children.iter_mut().zip(running.iter_mut()) {
        if *running {
            *running = false;
            if let Err(fault) = child.end(ctx, true) {
                first_fault.get_or_insert(fault);
            }
        }
    }
    first_fault.map_or(Ok(()), Err)
}

/// Initialize every child, marking each running before its entry action.
fn initialize_all(
    children: &mut [Box<dyn Command>],
    running: &mut [bool],
    ctx: &mut CommandContext<'_>,
) -> Result<(), CommandFault> {
    running.fill(false);
    for (child, running) in children.iter_mut().zip(running.iter_mut()) {
        *running = true;
        child.initialize(ctx)?;
    }
    Ok(())
}

/// Step each running child; children that finish end naturally.
///
/// Returns true when `watch` (if any) finished this tick, or when any child
/// finished if `watch` is `None`.
fn step_running(
    children: &mut [Box<dyn Command>],
    running: &mut [bool],
    ctx: &mut CommandContext<'_>,
    watch: Option<usize>,
) -> Result<bool, CommandFault> {
    let mut watched_done = false;
    for (i, (child, running)) in children.iter_mut().zip(running.iter_mut()).enumerate() {
        if !*running {
            continue;
        }
        child.execute(ctx)?;
        if child.is_finished(ctx) {
            *running = false;
            child.end(ctx, false)?;
            if watch.is_none_or(|w| w == i) {
                watched_done = true;
            }
        }
    }
    Ok(watched_done)
}

// ─── Sequence ───────────────────────────────────────────────────────

/// Runs children one at a time, in order.
///
/// Child *i+1* is initialised in the tick child *i* ends naturally and first
/// executes on the following tick.
pub struct Sequence {
    name: String,
    children: Vec<Box<dyn Command>>,
    requirements: Requirements,
    behavior: InterruptionBehavior,
    current: usize,
    /// Whether `children[current]` has been initialised and not yet ended.
    started: bool,
}

impl Sequence {
    pub fn new(children: Vec<Box<dyn Command>>) -> Result<Self, CompositionError> {
        check_not_empty(GroupKind::Sequence, &children)?;
        Ok(Self::build(children))
    }

    /// Two-element sequence; cannot fail.
    pub fn pair(first: Box<dyn Command>, second: Box<dyn Command>) -> Self {
        Self::build(vec![first, second])
    }

    fn build(children: Vec<Box<dyn Command>>) -> Self {
        Self {
            name: group_name(GroupKind::Sequence, &children),
            requirements: union_requirements(&children),
            behavior: combined_behavior(&children),
            current: children.len(),
            started: false,
            children,
        }
    }

    /// Index of the child currently running.
    pub fn current_index(&self) -> Option<usize> {
        (self.current < self.children.len()).then_some(self.current)
    }
}

impl Command for Sequence {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> Requirements {
        self.requirements
    }

    fn interruption_behavior(&self) -> InterruptionBehavior {
        self.behavior
    }

    fn initialize(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), CommandFault> {
        self.current = 0;
        self.started = true;
        self.children[0].initialize(ctx)
    }

    fn execute(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), CommandFault> {
        let Some(child) = self.children.get_mut(self.current) else {
            return Ok(());
        };
        child.execute(ctx)?;
        if child.is_finished(ctx) {
            // Advance first so a fault in `end` cannot end this child twice.
            self.current += 1;
            self.started = false;
            child.end(ctx, false)?;
            if let Some(next) = self.children.get_mut(self.current) {
                self.started = true;
                next.initialize(ctx)?;
            }
        }
        Ok(())
    }

    fn is_finished(&self, _ctx: &CommandContext<'_>) -> bool {
        self.current >= self.children.len()
    }

    fn end(&mut self, ctx: &mut CommandContext<'_>, _interrupted: bool) -> Result<(), CommandFault> {
        let index = std::mem::replace(&mut self.current, self.children.len());
        if !std::mem::take(&mut self.started) {
            return Ok(());
        }
        match self.children.get_mut(index) {
            Some(child) => child.end(ctx, true),
            None => Ok(()),
        }
    }
}

// ─── Parallel (all) ─────────────────────────────────────────────────

/// Runs children together; finishes when all have finished.
pub struct Parallel {
    name: String,
    children: Vec<Box<dyn Command>>,
    running: Vec<bool>,
    requirements: Requirements,
    behavior: InterruptionBehavior,
}

impl Parallel {
    pub fn new(children: Vec<Box<dyn Command>>) -> Result<Self, CompositionError> {
        check_not_empty(GroupKind::Parallel, &children)?;
        check_disjoint(GroupKind::Parallel, &children)?;
        Ok(Self {
            name: group_name(GroupKind::Parallel, &children),
            running: vec![false; children.len()],
            requirements: union_requirements(&children),
            behavior: combined_behavior(&children),
            children,
        })
    }
}

impl Command for Parallel {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> Requirements {
        self.requirements
    }

    fn interruption_behavior(&self) -> InterruptionBehavior {
        self.behavior
    }

    fn initialize(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), CommandFault> {
        initialize_all(&mut self.children, &mut self.running, ctx)
    }

    fn execute(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), CommandFault> {
        step_running(&mut self.children, &mut self.running, ctx, None).map(|_| ())
    }

    fn is_finished(&self, _ctx: &CommandContext<'_>) -> bool {
        !self.running.iter().any(|r| *r)
    }

    fn end(&mut self, ctx: &mut CommandContext<'_>, _interrupted: bool) -> Result<(), CommandFault> {
        interrupt_running(&mut self.children, &mut self.running, ctx)
    }
}

// ─── Race ───────────────────────────────────────────────────────────

/// Runs children together; finishes as soon as any one finishes.
///
/// Every running child executes in the finishing tick; the ones still
/// running afterwards are interrupted.
pub struct Race {
    name: String,
    children: Vec<Box<dyn Command>>,
    running: Vec<bool>,
    requirements: Requirements,
    behavior: InterruptionBehavior,
    finished: bool,
}

impl Race {
    pub fn new(children: Vec<Box<dyn Command>>) -> Result<Self, CompositionError> {
        check_not_empty(GroupKind::Race, &children)?;
        check_disjoint(GroupKind::Race, &children)?;
        Ok(Self {
            name: group_name(GroupKind::Race, &children),
            running: vec![false; children.len()],
            requirements: union_requirements(&children),
            behavior: combined_behavior(&children),
            finished: false,
            children,
        })
    }
}

impl Command for Race {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> Requirements {
        self.requirements
    }

    fn interruption_behavior(&self) -> InterruptionBehavior {
        self.behavior
    }

    fn initialize(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), CommandFault> {
        self.finished = false;
        initialize_all(&mut self.children, &mut self.running, ctx)
    }

    fn execute(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), CommandFault> {
        if step_running(&mut self.children, &mut self.running, ctx, None)? {
            self.finished = true;
        }
        Ok(())
    }

    fn is_finished(&self, _ctx: &CommandContext<'_>) -> bool {
        self.finished
    }

    fn end(&mut self, ctx: &mut CommandContext<'_>, _interrupted: bool) -> Result<(), CommandFault> {
        interrupt_running(&mut self.children, &mut self.running, ctx)
    }
}

// ─── Deadline ───────────────────────────────────────────────────────

/// Runs children together; finishes when the leader (first child) finishes.
pub struct Deadline {
    name: String,
    children: Vec<Box<dyn Command>>,
    running: Vec<bool>,
    requirements: Requirements,
    behavior: InterruptionBehavior,
    finished: bool,
}

impl Deadline {
    pub fn new(
        leader: Box<dyn Command>,
        others: Vec<Box<dyn Command>>,
    ) -> Result<Self, CompositionError> {
        let mut children = Vec::with_capacity(others.len() + 1);
        children.push(leader);
        children.extend(others);
        check_disjoint(GroupKind::Deadline, &children)?;
        Ok(Self {
            name: group_name(GroupKind::Deadline, &children),
            running: vec![false; children.len()],
            requirements: union_requirements(&children),
            behavior: combined_behavior(&children),
            finished: false,
            children,
        })
    }
}

impl Command for Deadline {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> Requirements {
        self.requirements
    }

    fn interruption_behavior(&self) -> InterruptionBehavior {
        self.behavior
    }

    fn initialize(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), CommandFault> {
        self.finished = false;
        initialize_all(&mut self.children, &mut self.running, ctx)
    }

    fn execute(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), CommandFault> {
        if step_running(&mut self.children, &mut self.running, ctx, Some(0))? {
            self.finished = true;
        }
        Ok(())
    }

    fn is_finished(&self, _ctx: &CommandContext<'_>) -> bool {
        self.finished
    }

    fn end(&mut self, ctx: &mut CommandContext<'_>, _interrupted: bool) -> Result<(), CommandFault> {
        interrupt_running(&mut self.children, &mut self.running, ctx)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
