//! Scoring arm: one position-controlled joint with two named poses.

use std::time::Duration;

use cadence_scheduler::prelude::*;
use tracing::debug;

use crate::hardware::{JointDriver, JointLimits, JointStatus, SimulatedJoint};

/// Accepted distance from the goal angle [deg].
pub const ARM_TOLERANCE_DEG: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmState {
    Zero,
    Amp,
}

impl ArmState {
    /// Joint angle for this pose [deg].
    pub const fn angle(self) -> f64 {
        match self {
            Self::Zero => 0.0,
            Self::Amp => 95.0,
        }
    }
}

pub struct Arm {
    joint: Box<dyn JointDriver>,
    period: Duration,
    goal: ArmState,
    status: JointStatus,
}

impl Arm {
    pub fn new(joint: Box<dyn JointDriver>, period: Duration) -> Self {
        Self {
            joint,
            period,
            goal: ArmState::Zero,
            status: JointStatus::default(),
        }
    }

    pub fn simulated(period: Duration) -> Self {
        let limits = JointLimits {
            max_velocity: 240.0,
            max_acceleration: 960.0,
            in_position_window: ARM_TOLERANCE_DEG,
        };
        Self::new(Box::new(SimulatedJoint::new("arm.pivot", limits)), period)
    }

    pub fn angle(&self) -> f64 {
        self.status.position
    }
}

impl Subsystem for Arm {
    fn name(&self) -> &str {
        "arm"
    }

    fn periodic(&mut self) {
        self.status = self.joint.update(self.period);
    }

    fn reached_goal(&self) -> bool {
        (self.status.position - self.goal.angle()).abs() <= ARM_TOLERANCE_DEG
    }
}

impl GoalSubsystem for Arm {
    type Goal = ArmState;

    fn goal(&self) -> ArmState {
        self.goal
    }

    fn set_goal(&mut self, goal: ArmState) {
        debug!(from = ?self.goal, to = ?goal, "Arm goal");
        self.goal = goal;
        self.joint.command(goal.angle());
    }
}

/// Move to `state`, then hold the claim for a settle delay.
pub fn go_to_state(arm: SubsystemHandle<Arm>, state: ArmState) -> impl Command {
    commands::SetGoal::new(arm, state).and_then(commands::wait(Duration::from_secs(1)))
}
