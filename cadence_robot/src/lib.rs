//! # Cadence Robot
//!
//! Simulated robot wired onto the Cadence scheduler: an arm, a ground
//! intake and a holonomic drivetrain, operated through named buttons and
//! stick axes.
//!
//! # Module Structure
//!
//! - [`hardware`] - Simulated joints and rollers
//! - [`subsystems`] - Arm, intake and drivetrain with their commands
//! - [`io`] - Operator inputs and the scripted input player
//! - [`robot`] - Composition root (catalogue, defaults, bindings)
//! - [`config`] - Configuration file with the simulation script

pub mod config;
pub mod error;
pub mod hardware;
pub mod io;
pub mod robot;
pub mod subsystems;

pub use error::RobotError;
pub use robot::Robot;
