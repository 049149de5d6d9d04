//! Telemetry sink for fire-and-forget status strings.
//!
//! The scheduler reports command lifecycle transitions here; commands report
//! their own messages through [`CommandContext::report`](crate::command::CommandContext::report).
//! Delivery is never awaited and never affects scheduling.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use tracing::info;

/// Destination for status messages.
pub trait Reporter {
    fn report(&mut self, message: &str);
}

/// Forwards messages to `tracing` under the `cadence::telemetry` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&mut self, message: &str) {
        info!(target: "cadence::telemetry", "{message}");
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&mut self, _message: &str) {}
}

/// Keeps the most recent messages in memory.
///
/// Clones share one buffer, so a clone kept by the caller observes what the
/// scheduler-owned instance receives.
#[derive(Debug, Clone)]
pub struct MemoryReporter {
    buffer: Rc<RefCell<VecDeque<String>>>,
    limit: usize,
}

impl MemoryReporter {
    pub const DEFAULT_LIMIT: usize = 512;

    pub fn with_limit(limit: usize) -> Self {
        Self {
            buffer: Rc::default(),
            limit: limit.max(1),
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.buffer.borrow().iter().cloned().collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.buffer.borrow().iter().any(|m| m.contains(needle))
    }

    pub fn clear(&self) {
        self.buffer.borrow_mut().clear();
    }
}

impl Default for MemoryReporter {
    fn default() -> Self {
        Self::with_limit(Self::DEFAULT_LIMIT)
    }
}

impl Reporter for MemoryReporter {
    fn report(&mut self, message: &str) {
        let mut buffer = self.buffer.borrow_mut();
        while buffer.len() >= self.limit {
            buffer.pop_front();
        }
        buffer.push_back(message.to_string());
    }
}
