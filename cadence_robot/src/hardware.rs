//! Simulated hardware behind the robot subsystems.
//!
//! Subsystems talk to a [`JointDriver`] and never to a concrete device, so
//! a real backend can replace [`SimulatedJoint`] without touching command
//! code.

use std::time::Duration;

use tracing::trace;

/// Snapshot of one joint, refreshed once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JointStatus {
    /// Current position [deg].
    pub position: f64,
    /// Current velocity [deg/s].
    pub velocity: f64,
    /// `|target - position|` within the in-position window.
    pub in_position: bool,
}

/// Position-controlled joint.
///
/// `update` is called from `Subsystem::periodic` and must not block.
pub trait JointDriver {
    fn name(&self) -> &str;

    /// Latch a new target position [deg].
    fn command(&mut self, target: f64);

    /// Advance by `dt` and return the fresh status.
    fn update(&mut self, dt: Duration) -> JointStatus;
}

/// Motion limits of a simulated joint.
#[derive(Debug, Clone, Copy)]
pub struct JointLimits {
    pub max_velocity: f64,
    pub max_acceleration: f64,
    pub in_position_window: f64,
}

impl Default for JointLimits {
    fn default() -> Self {
        Self {
            max_velocity: 180.0,
            max_acceleration: 720.0,
            in_position_window: 0.5,
        }
    }
}

/// Velocity- and acceleration-limited joint with a triangular profile.
#[derive(Debug, Clone)]
pub struct SimulatedJoint {
    name: String,
    limits: JointLimits,
    position: f64,
    velocity: f64,
    target: f64,
}

impl SimulatedJoint {
    pub fn new(name: impl Into<String>, limits: JointLimits) -> Self {
        Self {
            name: name.into(),
            limits,
            position: 0.0,
            velocity: 0.0,
            target: 0.0,
        }
    }

    fn status(&self) -> JointStatus {
        JointStatus {
            position: self.position,
            velocity: self.velocity,
            in_position: (self.target - self.position).abs() <= self.limits.in_position_window,
        }
    }
}

impl JointDriver for SimulatedJoint {
    fn name(&self) -> &str {
        &self.name
    }

    fn command(&mut self, target: f64) {
        self.target = target;
    }

    fn update(&mut self, dt: Duration) -> JointStatus {
        let dt = dt.as_secs_f64();
        let JointLimits {
            max_velocity,
            max_acceleration,
            in_position_window,
        } = self.limits;
        let error = self.target - self.position;

        if error.abs() <= in_position_window && self.velocity.abs() <= max_acceleration * dt {
            // Settle exactly on the target once inside the window.
            self.position = self.target;
            self.velocity = 0.0;
            return self.status();
        }

        let stopping_distance = self.velocity * self.velocity / (2.0 * max_acceleration);
        let desired = if error.abs() <= stopping_distance {
            error.signum() * (2.0 * max_acceleration * error.abs()).sqrt().min(max_velocity)
        } else {
            error.signum() * max_velocity
        };
        let max_change = max_acceleration * dt;
        self.velocity += (desired - self.velocity).clamp(-max_change, max_change);
        self.velocity = self.velocity.clamp(-max_velocity, max_velocity);
        self.position += self.velocity * dt;

        trace!(
            joint = %self.name,
            position = self.position,
            velocity = self.velocity,
            target = self.target,
            "Joint update"
        );
        self.status()
    }
}

/// Open-loop roller motor.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Roller {
    /// Duty cycle in `-1.0..=1.0`.
    speed: f64,
}

impl Roller {
    pub fn set(&mut self, speed: f64) {
        self.speed = speed.clamp(-1.0, 1.0);
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }
}
