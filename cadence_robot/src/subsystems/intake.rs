//! Ground intake: a tilting pivot, a roller and a beam-break note sensor.

use std::time::Duration;

use cadence_scheduler::prelude::*;
use tracing::{debug, info};

use crate::hardware::{JointDriver, JointLimits, JointStatus, Roller, SimulatedJoint};

pub const TILT_TOLERANCE_DEG: f64 = 1.0;

/// Roller duty while ejecting a note.
pub const EJECT_SPEED: f64 = -0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeState {
    Stow,
    ReadyHandoff,
    ExecuteHandoff,
    ExecutePickup,
}

impl IntakeState {
    /// Pivot angle [deg].
    pub const fn tilt(self) -> f64 {
        match self {
            Self::Stow => 0.0,
            Self::ReadyHandoff | Self::ExecuteHandoff => 15.0,
            Self::ExecutePickup => 125.0,
        }
    }

    /// Roller duty in this state.
    pub const fn roller(self) -> f64 {
        match self {
            Self::Stow | Self::ReadyHandoff => 0.0,
            Self::ExecuteHandoff => -0.6,
            Self::ExecutePickup => 0.8,
        }
    }
}

pub struct Intake {
    pivot: Box<dyn JointDriver>,
    roller: Roller,
    beam: Signal,
    period: Duration,
    goal: IntakeState,
    status: JointStatus,
    has_note: bool,
}

impl Intake {
    /// `beam` is the beam-break sensor line, true while a note blocks it.
    pub fn new(pivot: Box<dyn JointDriver>, beam: Signal, period: Duration) -> Self {
        Self {
            pivot,
            roller: Roller::default(),
            beam,
            period,
            goal: IntakeState::Stow,
            status: JointStatus::default(),
            has_note: false,
        }
    }

    pub fn simulated(beam: Signal, period: Duration) -> Self {
        let limits = JointLimits {
            max_velocity: 360.0,
            max_acceleration: 1800.0,
            in_position_window: TILT_TOLERANCE_DEG,
        };
        Self::new(Box::new(SimulatedJoint::new("intake.pivot", limits)), beam, period)
    }

    pub fn has_note(&self) -> bool {
        self.has_note
    }

    pub fn tilt(&self) -> f64 {
        self.status.position
    }

    pub fn roller_speed(&self) -> f64 {
        self.roller.speed()
    }

    /// Override the roller without changing the goal state.
    pub fn set_speed(&mut self, speed: f64) {
        self.roller.set(speed);
    }
}

impl Subsystem for Intake {
    fn name(&self) -> &str {
        "intake"
    }

    fn periodic(&mut self) {
        self.status = self.pivot.update(self.period);
        let note = self.beam.get();
        if note != self.has_note {
            info!(has_note = note, "Intake note sensor changed");
        }
        self.has_note = note;
    }

    fn reached_goal(&self) -> bool {
        (self.status.position - self.goal.tilt()).abs() <= TILT_TOLERANCE_DEG
    }
}

impl GoalSubsystem for Intake {
    type Goal = IntakeState;

    fn goal(&self) -> IntakeState {
        self.goal
    }

    fn set_goal(&mut self, goal: IntakeState) {
        debug!(from = ?self.goal, to = ?goal, "Intake goal");
        self.goal = goal;
        self.pivot.command(goal.tilt());
        self.roller.set(goal.roller());
    }
}

// ─── Commands ───────────────────────────────────────────────────────

pub fn stow(intake: SubsystemHandle<Intake>) -> impl Command {
    commands::go_to(intake, IntakeState::Stow)
}

/// Tilt to the handoff pose, then feed the note out.
pub fn handoff(intake: SubsystemHandle<Intake>) -> impl Command {
    commands::go_to(intake, IntakeState::ReadyHandoff)
        .and_then(commands::SetGoal::new(intake, IntakeState::ExecuteHandoff))
}

pub fn ready_handoff(intake: SubsystemHandle<Intake>) -> impl Command {
    commands::SetGoal::new(intake, IntakeState::ReadyHandoff).with_timeout(Duration::from_secs(1))
}

pub fn start_pickup(intake: SubsystemHandle<Intake>) -> impl Command {
    commands::SetGoal::new(intake, IntakeState::ExecutePickup)
}

/// Deploy, run the roller until a note breaks the beam, then stow.
pub fn pickup(intake: SubsystemHandle<Intake>) -> impl Command {
    start_pickup(intake)
        .and_then(commands::wait_until("wait_for_note", move |ctx| {
            ctx.subsystem(intake).is_ok_and(Intake::has_note)
        }))
        .and_then(stow(intake))
}

/// Reverse the roller briefly, then stow.
pub fn eject(intake: SubsystemHandle<Intake>) -> impl Command {
    commands::run_once("eject_roller", intake.into(), move |ctx| {
        ctx.subsystem_mut(intake)?.set_speed(EJECT_SPEED);
        Ok(())
    })
    .and_then(commands::wait(Duration::from_millis(500)))
    .and_then(stow(intake))
}
