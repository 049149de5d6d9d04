//! Edge-triggered bindings from boolean conditions to scheduler requests.
//!
//! A [`Trigger`] samples its [`Condition`] once per tick, compares it with
//! the previous sample and, for every binding whose edge fired, emits a
//! [`SchedulerRequest`]. Triggers hold no command state of their own.
//!
//! | builder            | edge     | action        |
//! |--------------------|----------|---------------|
//! | `on_true`          | rising   | schedule      |
//! | `on_false`         | falling  | schedule      |
//! | `while_true`       | high     | schedule      |
//! |                    | falling  | cancel        |
//! | `while_false`      | low      | schedule      |
//! |                    | rising   | cancel        |
//! | `toggle_on_true`   | rising   | toggle        |
//! | `cancel_on_true`   | rising   | cancel        |
//! | `cancel_all_on_true` | rising | cancel all    |

pub mod condition;
pub mod table;

use std::fmt;

pub use condition::{Condition, Signal};
pub use table::{resolve_bindings, InputMap};

use crate::command::{CommandTemplate, SchedulerRequest};
use crate::config::BindingKind;
use crate::subsystem::SubsystemRegistry;

/// Condition transition a binding reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// false → true.
    Rising,
    /// true → false.
    Falling,
    /// Every tick the condition is true.
    High,
    /// Every tick the condition is false.
    Low,
}

impl Edge {
    #[inline]
    pub const fn fires(self, previous: bool, current: bool) -> bool {
        match self {
            Self::Rising => !previous && current,
            Self::Falling => previous && !current,
            Self::High => current,
            Self::Low => !current,
        }
    }
}

/// What a binding asks the scheduler to do when its edge fires.
#[derive(Clone)]
pub enum BindingAction {
    Schedule(CommandTemplate),
    Cancel(CommandTemplate),
    /// Cancel if scheduled, schedule otherwise.
    ///
    /// Resolved when the scheduler applies the request, so it sees the
    /// effect of requests queued earlier in the same tick.
    Toggle(CommandTemplate),
    CancelAll,
}

impl BindingAction {
    fn request(&self) -> SchedulerRequest {
        match self {
            Self::Schedule(t) => SchedulerRequest::Schedule(t.clone()),
            Self::Cancel(t) => SchedulerRequest::Cancel(t.clone()),
            Self::Toggle(t) => SchedulerRequest::Toggle(t.clone()),
            Self::CancelAll => SchedulerRequest::CancelAll,
        }
    }
}

impl fmt::Debug for BindingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schedule(t) => write!(f, "Schedule({})", t.name()),
            Self::Cancel(t) => write!(f, "Cancel({})", t.name()),
            Self::Toggle(t) => write!(f, "Toggle({})", t.name()),
            Self::CancelAll => f.write_str("CancelAll"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Binding {
    pub edge: Edge,
    pub action: BindingAction,
}

/// Boolean condition plus its (edge, action) bindings.
pub struct Trigger {
    name: String,
    condition: Condition,
    bindings: Vec<Binding>,
    previous: bool,
}

impl Trigger {
    /// The first sample is compared against `false`, so a condition that is
    /// already true fires its rising bindings on the first tick.
    pub fn new(name: impl Into<String>, condition: impl Into<Condition>) -> Self {
        Self {
            name: name.into(),
            condition: condition.into(),
            bindings: Vec::new(),
            previous: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Last sampled value.
    pub fn value(&self) -> bool {
        self.previous
    }

    pub fn bind(mut self, edge: Edge, action: BindingAction) -> Self {
        self.push(edge, action);
        self
    }

    pub fn on_true(self, template: &CommandTemplate) -> Self {
        self.bind(Edge::Rising, BindingAction::Schedule(template.clone()))
    }

    pub fn on_false(self, template: &CommandTemplate) -> Self {
        self.bind(Edge::Falling, BindingAction::Schedule(template.clone()))
    }

    pub fn while_true(self, template: &CommandTemplate) -> Self {
        self.bind(Edge::High, BindingAction::Schedule(template.clone()))
            .bind(Edge::Falling, BindingAction::Cancel(template.clone()))
    }

    pub fn while_false(self, template: &CommandTemplate) -> Self {
        self.bind(Edge::Low, BindingAction::Schedule(template.clone()))
            .bind(Edge::Rising, BindingAction::Cancel(template.clone()))
    }

    pub fn toggle_on_true(self, template: &CommandTemplate) -> Self {
        self.bind(Edge::Rising, BindingAction::Toggle(template.clone()))
    }

    pub fn cancel_on_true(self, template: &CommandTemplate) -> Self {
        self.bind(Edge::Rising, BindingAction::Cancel(template.clone()))
    }

    pub fn cancel_all_on_true(self) -> Self {
        self.bind(Edge::Rising, BindingAction::CancelAll)
    }

    fn push(&mut self, edge: Edge, action: BindingAction) {
        self.bindings.push(Binding { edge, action });
    }

    /// Add the bindings of one table row. `template` is ignored for
    /// [`BindingKind::CancelAllOnTrue`].
    pub(crate) fn bind_kind(&mut self, kind: BindingKind, template: Option<&CommandTemplate>) {
        let Some(t) = template else {
            if kind == BindingKind::CancelAllOnTrue {
                self.push(Edge::Rising, BindingAction::CancelAll);
            }
            return;
        };
        match kind {
            BindingKind::OnTrue => self.push(Edge::Rising, BindingAction::Schedule(t.clone())),
            BindingKind::OnFalse => self.push(Edge::Falling, BindingAction::Schedule(t.clone())),
            BindingKind::WhileTrue => {
                self.push(Edge::High, BindingAction::Schedule(t.clone()));
                self.push(Edge::Falling, BindingAction::Cancel(t.clone()));
            }
            BindingKind::WhileFalse => {
                self.push(Edge::Low, BindingAction::Schedule(t.clone()));
                self.push(Edge::Rising, BindingAction::Cancel(t.clone()));
            }
            BindingKind::ToggleOnTrue => self.push(Edge::Rising, BindingAction::Toggle(t.clone())),
            BindingKind::CancelOnTrue => self.push(Edge::Rising, BindingAction::Cancel(t.clone())),
            BindingKind::CancelAllOnTrue => self.push(Edge::Rising, BindingAction::CancelAll),
        }
    }

    /// Sample the condition and append one request per fired binding, in
    /// binding order.
    pub(crate) fn poll(
        &mut self,
        subsystems: &SubsystemRegistry,
        out: &mut Vec<SchedulerRequest>,
    ) {
        let current = self.condition.evaluate(subsystems);
        let previous = std::mem::replace(&mut self.previous, current);
        for binding in &self.bindings {
            if binding.edge.fires(previous, current) {
                out.push(binding.action.request());
            }
        }
    }
}

impl fmt::Debug for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trigger")
            .field("name", &self.name)
            .field("bindings", &self.bindings)
            .field("previous", &self.previous)
            .finish()
    }
}
