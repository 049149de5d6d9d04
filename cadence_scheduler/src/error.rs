//! Error taxonomy for the scheduler.
//!
//! - [`CompositionError`]: construction-time misuse of command groups.
//! - [`CommandFault`]: runtime fault raised by a command callback. Contained
//!   at the command boundary; the scheduler never halts on it.
//! - [`SchedulerError`]: registration-time errors (subsystems, defaults).
//! - [`BindingError`]: binding table rows that cannot be resolved.

use std::fmt;

use thiserror::Error;

use crate::subsystem::SubsystemId;

/// Kind of command group, used in composition diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    Sequence,
    Parallel,
    Race,
    Deadline,
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sequence => "sequence",
            Self::Parallel => "parallel",
            Self::Race => "race",
            Self::Deadline => "deadline",
        };
        f.write_str(name)
    }
}

/// Command group built from invalid parts. Detected at composition time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompositionError {
    /// A group needs at least one member.
    #[error("{kind} group must contain at least one command")]
    EmptyGroup { kind: GroupKind },

    /// Concurrent members would claim the same subsystem.
    #[error("{kind} group members `{first}` and `{second}` require the same subsystem")]
    OverlappingRequirements {
        kind: GroupKind,
        first: String,
        second: String,
    },
}

/// Fault raised from an `initialize`, `execute` or `end` callback.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandFault {
    /// Free-form failure reported by the command itself.
    #[error("{0}")]
    Failed(String),

    /// The command touched a subsystem it did not declare as a requirement.
    #[error("subsystem {0} is not claimed by this command")]
    NotClaimed(SubsystemId),

    /// The handle does not refer to a registered subsystem.
    #[error("unknown subsystem {0}")]
    UnknownSubsystem(SubsystemId),

    /// Hardware collaborator reported an error.
    #[error("hardware fault: {0}")]
    Hardware(String),
}

impl CommandFault {
    /// Shorthand for [`CommandFault::Failed`].
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Registration errors returned by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("cannot register more than {max} subsystems")]
    TooManySubsystems { max: usize },

    #[error("subsystem name `{0}` is already registered")]
    DuplicateSubsystem(String),

    #[error("unknown subsystem {0}")]
    UnknownSubsystem(SubsystemId),

    #[error("default command `{command}` does not require subsystem `{subsystem}`")]
    DefaultCommandMissingRequirement { subsystem: String, command: String },

    #[error(transparent)]
    Composition(#[from] CompositionError),
}

/// Binding table row that cannot be turned into a trigger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    #[error("binding refers to unknown input `{0}`")]
    UnknownInput(String),

    #[error("binding refers to unknown command `{0}`")]
    UnknownCommand(String),

    #[error("binding on input `{input}` needs a command")]
    MissingCommand { input: String },
}
