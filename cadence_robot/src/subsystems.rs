//! Robot subsystems.
//!
//! Each one owns its simulated hardware, refreshes a sensor snapshot in
//! `periodic` and exposes goal states to commands.

pub mod arm;
pub mod drivetrain;
pub mod intake;

pub use arm::{Arm, ArmState};
pub use drivetrain::{ChassisSpeeds, Drivetrain, Pose};
pub use intake::{Intake, IntakeState};
