//! Commands over goal-state subsystems.

use crate::command::group::Sequence;
use crate::command::{Command, CommandContext, CommandExt};
use crate::error::CommandFault;
use crate::subsystem::{GoalSubsystem, Requirements, SubsystemHandle};

/// Sets a subsystem goal on initialize and finishes in the same tick.
pub struct SetGoal<S: GoalSubsystem> {
    name: String,
    handle: SubsystemHandle<S>,
    goal: S::Goal,
}

impl<S: GoalSubsystem> SetGoal<S> {
    pub fn new(handle: SubsystemHandle<S>, goal: S::Goal) -> Self {
        Self {
            name: format!("set_goal({goal:?})"),
            handle,
            goal,
        }
    }
}

impl<S: GoalSubsystem> Command for SetGoal<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> Requirements {
        self.handle.requirements()
    }

    fn initialize(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), CommandFault> {
        ctx.subsystem_mut(self.handle)?.set_goal(self.goal);
        Ok(())
    }

    fn is_finished(&self, _ctx: &CommandContext<'_>) -> bool {
        true
    }
}

/// Requirement-free wait for a subsystem to report its goal reached.
pub struct WaitForGoal<S> {
    name: String,
    handle: SubsystemHandle<S>,
}

impl<S: GoalSubsystem> WaitForGoal<S> {
    pub fn new(handle: SubsystemHandle<S>) -> Self {
        Self {
            name: format!("wait_for_goal({})", handle.id()),
            handle,
        }
    }
}

impl<S: GoalSubsystem> Command for WaitForGoal<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_finished(&self, ctx: &CommandContext<'_>) -> bool {
        ctx.subsystem(self.handle).is_ok_and(|s| s.reached_goal())
    }
}

/// Set the goal, then wait until it is reached.
pub fn go_to<S: GoalSubsystem>(handle: SubsystemHandle<S>, goal: S::Goal) -> Sequence {
    SetGoal::new(handle, goal).and_then(WaitForGoal::new(handle))
}
