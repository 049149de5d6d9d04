//! # Cadence Scheduler
//!
//! Cooperative, fixed-period command scheduler over exclusive robot
//! subsystems.
//!
//! - A **subsystem** owns one physical resource and a finite goal state.
//! - A **command** claims a set of subsystems, runs once per tick until its
//!   completion predicate holds, then releases them. Commands compose into
//!   sequences, parallel groups, races and deadlines, and can be decorated
//!   with timeouts and extra end conditions.
//! - A **trigger** samples a boolean condition every tick and turns its
//!   edges into schedule or cancel requests.
//! - The **scheduler** resolves requirement conflicts, steps running
//!   commands in a fixed order and re-arms default commands.
//!
//! Everything runs on one thread; nothing in a tick blocks.
//!
//! ```rust
//! use std::time::Duration;
//! use cadence_scheduler::prelude::*;
//!
//! let mut scheduler = Scheduler::new(Duration::from_millis(20));
//! let hello = CommandTemplate::new("hello", || commands::print("hello"));
//! scheduler.schedule(&hello);
//! scheduler.run();
//! assert!(!scheduler.is_scheduled(&hello));
//! ```

pub mod command;
pub mod commands;
pub mod config;
pub mod cycle;
pub mod error;
pub mod scheduler;
pub mod subsystem;
pub mod telemetry;
pub mod trigger;

/// Common imports for composition roots and tests.
pub mod prelude {
    pub use crate::command::{
        Command, CommandCatalog, CommandContext, CommandExt, CommandTemplate,
        InterruptionBehavior,
    };
    pub use crate::commands;
    pub use crate::error::{BindingError, CommandFault, CompositionError, SchedulerError};
    pub use crate::scheduler::{EndReason, RunId, ScheduleOutcome, Scheduler, SchedulerEvent};
    pub use crate::subsystem::{
        GoalSubsystem, Requirements, Subsystem, SubsystemHandle, SubsystemId,
    };
    pub use crate::telemetry::{MemoryReporter, NullReporter, Reporter, TracingReporter};
    pub use crate::trigger::{Condition, Edge, InputMap, Signal, Trigger};
}
