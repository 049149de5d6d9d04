//! Claim table: subsystem → claiming run.

use cadence_common::consts::MAX_SUBSYSTEMS;

use crate::scheduler::RunId;
use crate::subsystem::{Requirements, SubsystemId};

/// Fixed-size claim table, one slot per subsystem id.
///
/// Single source of truth for exclusivity: a slot holds at most one run.
#[derive(Debug, Clone)]
pub(crate) struct ClaimTable {
    slots: [Option<RunId>; MAX_SUBSYSTEMS],
}

impl ClaimTable {
    pub(crate) const fn new() -> Self {
        Self {
            slots: [None; MAX_SUBSYSTEMS],
        }
    }

    #[inline]
    pub(crate) fn holder(&self, id: SubsystemId) -> Option<RunId> {
        self.slots[id.index()]
    }

    /// Distinct runs holding any member of `set`, in subsystem order.
    pub(crate) fn holders(&self, set: Requirements) -> Vec<RunId> {
        let mut out: Vec<RunId> = Vec::new();
        for run in set.ids().filter_map(|id| self.holder(id)) {
            if !out.contains(&run) {
                out.push(run);
            }
        }
        out
    }

    /// Assign every member of `set` to `run`. Callers must have released
    /// previous holders first.
    pub(crate) fn grant(&mut self, set: Requirements, run: RunId) {
        for id in set.ids() {
            debug_assert!(self.slots[id.index()].is_none(), "double claim on {id}");
            self.slots[id.index()] = Some(run);
        }
    }

    pub(crate) fn release(&mut self, run: RunId) {
        for slot in &mut self.slots {
            if *slot == Some(run) {
                *slot = None;
            }
        }
    }

    /// Subsystems currently held by `run`.
    pub(crate) fn held_by(&self, run: RunId) -> Requirements {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| **slot == Some(run))
            .map(|(i, _)| SubsystemId::from_index(i))
            .collect()
    }
}
