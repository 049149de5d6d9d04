//! Holonomic drivetrain with dead-reckoned odometry.

use std::time::Duration;

use cadence_scheduler::prelude::*;

use crate::io::Axis;

pub const MAX_SPEED_MPS: f64 = 4.5;
pub const MAX_TURN_RADPS: f64 = 3.0 * std::f64::consts::PI;

/// Stick values below this magnitude read as zero.
pub const STICK_DEADBAND: f64 = 0.08;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChassisSpeeds {
    /// Forward [m/s].
    pub vx: f64,
    /// Left [m/s].
    pub vy: f64,
    /// Counter-clockwise [rad/s].
    pub omega: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
}

pub struct Drivetrain {
    period: Duration,
    commanded: ChassisSpeeds,
    pose: Pose,
}

impl Drivetrain {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            commanded: ChassisSpeeds::default(),
            pose: Pose::default(),
        }
    }

    /// Robot-relative velocity request, clamped to the chassis limits.
    pub fn drive(&mut self, speeds: ChassisSpeeds) {
        self.commanded = ChassisSpeeds {
            vx: speeds.vx.clamp(-MAX_SPEED_MPS, MAX_SPEED_MPS),
            vy: speeds.vy.clamp(-MAX_SPEED_MPS, MAX_SPEED_MPS),
            omega: speeds.omega.clamp(-MAX_TURN_RADPS, MAX_TURN_RADPS),
        };
    }

    pub fn stop(&mut self) {
        self.commanded = ChassisSpeeds::default();
    }

    pub fn speeds(&self) -> ChassisSpeeds {
        self.commanded
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn reset_heading(&mut self) {
        self.pose.heading = 0.0;
    }
}

impl Subsystem for Drivetrain {
    fn name(&self) -> &str {
        "drivetrain"
    }

    fn periodic(&mut self) {
        let dt = self.period.as_secs_f64();
        let ChassisSpeeds { vx, vy, omega } = self.commanded;
        let (sin, cos) = self.pose.heading.sin_cos();
        self.pose.x += (vx * cos - vy * sin) * dt;
        self.pose.y += (vx * sin + vy * cos) * dt;
        self.pose.heading = (self.pose.heading + omega * dt).rem_euclid(std::f64::consts::TAU);
    }

    fn reached_goal(&self) -> bool {
        true
    }
}

fn shape(value: f64) -> f64 {
    if value.abs() < STICK_DEADBAND {
        0.0
    } else {
        value.clamp(-1.0, 1.0)
    }
}

/// Robot-centric teleop drive from three stick axes. Never finishes.
pub fn robot_centric_drive(
    drive: SubsystemHandle<Drivetrain>,
    forward: Axis,
    strafe: Axis,
    turn: Axis,
) -> impl Command {
    commands::run("drive.robot_centric", drive.into(), move |ctx| {
        let speeds = ChassisSpeeds {
            vx: -shape(forward.get()) * MAX_SPEED_MPS,
            vy: -shape(strafe.get()) * MAX_SPEED_MPS,
            omega: -shape(turn.get()) * MAX_TURN_RADPS,
        };
        ctx.subsystem_mut(drive)?.drive(speeds);
        Ok(())
    })
    .finally_do(move |ctx, _| {
        ctx.subsystem_mut(drive)?.stop();
        Ok(())
    })
}

pub fn reset_heading(drive: SubsystemHandle<Drivetrain>) -> impl Command {
    commands::run_once("drive.reset_heading", drive.into(), move |ctx| {
        ctx.subsystem_mut(drive)?.reset_heading();
        Ok(())
    })
}
