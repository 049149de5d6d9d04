//! Subsystems: exclusive-access wrappers around one physical actuator.
//!
//! A subsystem is registered once with the scheduler and lives until
//! shutdown. Registration hands back a typed [`SubsystemHandle`] that
//! commands use to declare requirements and to reach the subsystem through
//! their [`CommandContext`](crate::command::CommandContext).
//!
//! Goal-mutating access is only granted to the command that currently holds
//! the subsystem's claim; read access (e.g. `reached_goal()`) is open to all.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

use bitflags::bitflags;
use cadence_common::consts::MAX_SUBSYSTEMS;
use static_assertions::const_assert;

use crate::command::CommandTemplate;
use crate::error::SchedulerError;

// ─── Identity ───────────────────────────────────────────────────────

/// Stable index of a registered subsystem (registration order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubsystemId(u8);

// Every id must fit in the `u8` index and the `u64` requirement mask.
const_assert!(MAX_SUBSYSTEMS <= u8::MAX as usize);
const_assert!(MAX_SUBSYSTEMS <= u64::BITS as usize);

impl SubsystemId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub(crate) const fn from_index(index: usize) -> Self {
        Self(index as u8)
    }
}

impl fmt::Display for SubsystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

bitflags! {
    /// Set of subsystems, one bit per [`SubsystemId`].
    ///
    /// Used for command requirement sets and claim queries.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Requirements: u64 {
        const _ = !0;
    }
}

impl Requirements {
    /// Set containing a single subsystem.
    /// Empty for an id past the mask width.
    #[inline]
    pub const fn of(id: SubsystemId) -> Self {
        match 1u64.checked_shl(id.0 as u32) {
            Some(bit) => Self::from_bits_retain(bit),
            None => Self::empty(),
        }
    }

    /// This set plus `id`.
    #[inline]
    pub const fn with(self, id: SubsystemId) -> Self {
        self.union(Self::of(id))
    }

    #[inline]
    pub const fn requires(self, id: SubsystemId) -> bool {
        self.contains(Self::of(id))
    }

    /// Members in ascending id order.
    pub fn ids(self) -> impl Iterator<Item = SubsystemId> {
        (0..MAX_SUBSYSTEMS)
            .filter(move |i| self.bits() & (1u64 << i) != 0)
            .map(SubsystemId::from_index)
    }
}

impl Default for Requirements {
    fn default() -> Self {
        Self::empty()
    }
}

impl FromIterator<SubsystemId> for Requirements {
    fn from_iter<I: IntoIterator<Item = SubsystemId>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}

/// Typed reference to a registered subsystem of type `S`.
///
/// Cheap to copy; carries no borrow of the subsystem itself.
pub struct SubsystemHandle<S> {
    id: SubsystemId,
    _marker: PhantomData<fn() -> S>,
}

impl<S> SubsystemHandle<S> {
    pub(crate) const fn new(id: SubsystemId) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub const fn id(&self) -> SubsystemId {
        self.id
    }

    /// Requirement set containing only this subsystem.
    #[inline]
    pub const fn requirements(&self) -> Requirements {
        Requirements::of(self.id)
    }
}

impl<S> Clone for SubsystemHandle<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for SubsystemHandle<S> {}

impl<S> PartialEq for SubsystemHandle<S> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<S> Eq for SubsystemHandle<S> {}

impl<S> fmt::Debug for SubsystemHandle<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SubsystemHandle").field(&self.id).finish()
    }
}

impl<S> From<SubsystemHandle<S>> for Requirements {
    fn from(handle: SubsystemHandle<S>) -> Self {
        handle.requirements()
    }
}

// ─── Traits ─────────────────────────────────────────────────────────

/// One physical resource under exclusive control.
///
/// No method may block: every call completes within the current period.
pub trait Subsystem: 'static {
    /// Unique, human-readable name (used in logs and telemetry).
    fn name(&self) -> &str;

    /// Called once per tick before triggers are evaluated.
    ///
    /// Refresh cached sensor data from the hardware collaborator here.
    fn periodic(&mut self) {}

    /// Whether the subsystem has reached its current goal.
    ///
    /// Must be a pure read of the latest sensor snapshot.
    fn reached_goal(&self) -> bool;

    /// Fallback behaviour run whenever no other command claims this subsystem.
    ///
    /// Queried once, at registration. The returned template must require
    /// `handle`.
    fn default_command(&self, handle: SubsystemHandle<Self>) -> Option<CommandTemplate>
    where
        Self: Sized,
    {
        let _ = handle;
        None
    }
}

/// Subsystem driven by a finite set of named goal states.
pub trait GoalSubsystem: Subsystem {
    type Goal: Copy + fmt::Debug + PartialEq + 'static;

    fn goal(&self) -> Self::Goal;

    /// Record the desired state. No guarantee of immediate motion.
    fn set_goal(&mut self, goal: Self::Goal);
}

trait ErasedSubsystem: Subsystem {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<S: Subsystem> ErasedSubsystem for S {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ─── Registry ───────────────────────────────────────────────────────

/// Owner of every registered subsystem, indexed by [`SubsystemId`].
///
/// Subsystems are never removed once registered.
#[derive(Default)]
pub struct SubsystemRegistry {
    entries: Vec<Box<dyn ErasedSubsystem>>,
}

impl SubsystemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn insert<S: Subsystem>(
        &mut self,
        subsystem: S,
    ) -> Result<SubsystemHandle<S>, SchedulerError> {
        let id = self.next_id(subsystem.name())?;
        self.entries.push(Box::new(subsystem));
        Ok(SubsystemHandle::new(id))
    }

    /// Id the next subsystem named `name` would receive.
    pub(crate) fn next_id(&self, name: &str) -> Result<SubsystemId, SchedulerError> {
        if self.entries.len() >= MAX_SUBSYSTEMS {
            return Err(SchedulerError::TooManySubsystems {
                max: MAX_SUBSYSTEMS,
            });
        }
        if self.entries.iter().any(|e| e.name() == name) {
            return Err(SchedulerError::DuplicateSubsystem(name.to_string()));
        }
        Ok(SubsystemId::from_index(self.entries.len()))
    }

    /// Typed read access.
    pub fn get<S: Subsystem>(&self, handle: SubsystemHandle<S>) -> Option<&S> {
        self.entries
            .get(handle.id.index())
            .and_then(|e| e.as_any().downcast_ref::<S>())
    }

    pub(crate) fn get_mut<S: Subsystem>(&mut self, handle: SubsystemHandle<S>) -> Option<&mut S> {
        self.entries
            .get_mut(handle.id.index())
            .and_then(|e| e.as_any_mut().downcast_mut::<S>())
    }

    pub fn name(&self, id: SubsystemId) -> Option<&str> {
        self.entries.get(id.index()).map(|e| e.name())
    }

    pub fn reached_goal(&self, id: SubsystemId) -> Option<bool> {
        self.entries.get(id.index()).map(|e| e.reached_goal())
    }

    /// Ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = SubsystemId> + use<> {
        (0..self.entries.len()).map(SubsystemId::from_index)
    }

    /// Every registered subsystem as one set.
    pub fn all(&self) -> Requirements {
        self.ids().collect()
    }

    /// Comma-separated names of the members of `set`.
    pub fn describe(&self, set: Requirements) -> String {
        set.ids()
            .filter_map(|id| self.name(id))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub(crate) fn periodic_all(&mut self) {
        for entry in &mut self.entries {
            entry.periodic();
        }
    }
}

impl fmt::Debug for SubsystemRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| e.name()))
            .finish()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
