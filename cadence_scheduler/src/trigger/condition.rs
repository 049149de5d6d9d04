//! Boolean conditions sampled by triggers.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::subsystem::{Subsystem, SubsystemHandle, SubsystemRegistry};

/// Shared boolean written by the input source and read by conditions.
///
/// Clones observe the same value.
#[derive(Clone, Default)]
pub struct Signal(Rc<Cell<bool>>);

impl Signal {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn set(&self, value: bool) {
        self.0.set(value);
    }

    #[inline]
    pub fn get(&self) -> bool {
        self.0.get()
    }
}

impl fmt::Debug for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Signal").field(&self.get()).finish()
    }
}

/// Boolean condition evaluated once per tick.
pub struct Condition {
    eval: Box<dyn FnMut(&SubsystemRegistry) -> bool>,
}

impl Condition {
    pub fn new<F>(eval: F) -> Self
    where
        F: FnMut(&SubsystemRegistry) -> bool + 'static,
    {
        Self {
            eval: Box::new(eval),
        }
    }

    /// Mirror an input signal.
    pub fn from_signal(signal: Signal) -> Self {
        Self::new(move |_| signal.get())
    }

    /// Sensor edge read from a registered subsystem. False if the handle is
    /// not registered.
    pub fn from_subsystem<S, F>(handle: SubsystemHandle<S>, read: F) -> Self
    where
        S: Subsystem,
        F: Fn(&S) -> bool + 'static,
    {
        Self::new(move |registry| registry.get(handle).is_some_and(&read))
    }

    pub fn evaluate(&mut self, subsystems: &SubsystemRegistry) -> bool {
        (self.eval)(subsystems)
    }

    pub fn and(mut self, mut other: Condition) -> Self {
        Self::new(move |r| {
            // Evaluate both so stateful operands (debounce) see every tick.
            let a = self.evaluate(r);
            let b = other.evaluate(r);
            a && b
        })
    }

    pub fn or(mut self, mut other: Condition) -> Self {
        Self::new(move |r| {
            let a = self.evaluate(r);
            let b = other.evaluate(r);
            a || b
        })
    }

    pub fn negate(mut self) -> Self {
        Self::new(move |r| !self.evaluate(r))
    }

    /// True only after the inner condition has held for `ticks` consecutive
    /// evaluations; false as soon as it drops.
    pub fn debounce(mut self, ticks: u32) -> Self {
        let mut held = 0u32;
        Self::new(move |r| {
            if self.evaluate(r) {
                held = held.saturating_add(1);
            } else {
                held = 0;
            }
            held >= ticks.max(1)
        })
    }
}

impl From<Signal> for Condition {
    fn from(signal: Signal) -> Self {
        Self::from_signal(signal)
    }
}
