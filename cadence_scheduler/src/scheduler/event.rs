//! Scheduler events and the bounded log that keeps them.

use std::fmt;

use cadence_common::consts::DEFAULT_EVENT_LOG_LIMIT;
use heapless::Deque;

use crate::error::{CommandFault, CompositionError};
use crate::scheduler::RunId;

/// Why a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum EndReason {
    /// Completion predicate held.
    Finished,
    /// A timeout decorator expired.
    TimedOut,
    /// Preempted by an incoming command.
    Interrupted { by: String },
    /// Explicit cancel request.
    Cancelled,
    /// A callback faulted.
    Faulted(CommandFault),
}

impl EndReason {
    /// Whether `end` is called with `interrupted = true`.
    #[inline]
    pub fn is_interrupted(&self) -> bool {
        !matches!(self, Self::Finished)
    }
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finished => f.write_str("finished"),
            Self::TimedOut => f.write_str("timed out"),
            Self::Interrupted { by } => write!(f, "interrupted by {by}"),
            Self::Cancelled => f.write_str("cancelled"),
            Self::Faulted(fault) => write!(f, "faulted: {fault}"),
        }
    }
}

/// Observable scheduler transition.
#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerEvent {
    Initialized {
        tick: u64,
        run: RunId,
        name: String,
    },
    Ended {
        tick: u64,
        run: RunId,
        name: String,
        reason: EndReason,
    },
    /// Conflict with a non-interruptible holder; never initialized.
    Rejected {
        tick: u64,
        name: String,
        blocked_by: Vec<String>,
    },
    /// Template factory failed to compose a run.
    Invalid {
        tick: u64,
        name: String,
        error: CompositionError,
    },
}

impl SchedulerEvent {
    pub fn tick(&self) -> u64 {
        match self {
            Self::Initialized { tick, .. }
            | Self::Ended { tick, .. }
            | Self::Rejected { tick, .. }
            | Self::Invalid { tick, .. } => *tick,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Initialized { name, .. }
            | Self::Ended { name, .. }
            | Self::Rejected { name, .. }
            | Self::Invalid { name, .. } => name,
        }
    }
}

/// Most recent events, oldest dropped first.
pub(crate) struct EventLog {
    events: Deque<SchedulerEvent, DEFAULT_EVENT_LOG_LIMIT>,
    limit: usize,
    dropped: u64,
}

impl EventLog {
    pub(crate) fn new(limit: usize) -> Self {
        Self {
            events: Deque::new(),
            limit: limit.clamp(1, DEFAULT_EVENT_LOG_LIMIT),
            dropped: 0,
        }
    }

    pub(crate) fn push(&mut self, event: SchedulerEvent) {
        while self.events.len() >= self.limit {
            self.events.pop_front();
            self.dropped += 1;
        }
        // Cannot fail: len < limit <= capacity.
        let _ = self.events.push_back(event);
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &SchedulerEvent> {
        self.events.iter()
    }

    pub(crate) fn drain(&mut self) -> Vec<SchedulerEvent> {
        let mut out = Vec::with_capacity(self.events.len());
        while let Some(event) = self.events.pop_front() {
            out.push(event);
        }
        out
    }

    pub(crate) fn dropped(&self) -> u64 {
        self.dropped
    }
}
