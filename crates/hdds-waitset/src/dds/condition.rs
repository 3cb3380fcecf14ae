// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! DDS Conditions - event notification predicates for WaitSets
//!
//! Per DDS v1.4 specification, Conditions are predicates that can be attached
//! to WaitSets to enable event-driven blocking wait patterns.
//!
//! The set of condition kinds is closed: [`GuardCondition`],
//! [`StatusCondition`] and [`ReadCondition`]. Their trigger logic lives in the
//! owning entity; this module only stores the value and forwards transitions
//! to the condition's [`ConditionNotifier`].

mod notifier;

pub use notifier::{ConditionNotifier, WaitsetSignal};

use super::read_condition::ReadCondition;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

pub(crate) mod sealed {
    pub trait Sealed {}
}

/// Condition trait - base interface for all DDS conditions
///
/// A Condition is a boolean-valued predicate that can be evaluated.
/// Conditions are attached to WaitSets to enable blocking waits.
///
/// This trait is sealed; match on [`Condition::kind`] to reach the
/// concrete type.
pub trait Condition: sealed::Sealed + Send + Sync {
    /// Get the current trigger value of this condition
    ///
    /// Cheap, lock-free and callable from any thread.
    fn get_trigger_value(&self) -> bool;

    /// Notifier used by WaitSets to register interest.
    fn notifier(&self) -> &ConditionNotifier;

    /// Concrete kind of this condition.
    fn kind(&self) -> ConditionKind<'_>;

    /// Get a unique identifier for this condition (for comparison)
    fn condition_id(&self) -> u64 {
        self.notifier().condition_id()
    }
}

/// Closed set of condition kinds.
#[derive(Clone, Copy)]
pub enum ConditionKind<'a> {
    /// Application-controlled trigger.
    Guard(&'a GuardCondition),
    /// Entity communication status changed.
    Status(&'a StatusCondition),
    /// Matching samples available on a reader.
    Read(&'a ReadCondition),
}

impl std::fmt::Debug for ConditionKind<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (name, cond): (&str, &dyn Condition) = match self {
            ConditionKind::Guard(c) => ("Guard", *c as &dyn Condition),
            ConditionKind::Status(c) => ("Status", *c as &dyn Condition),
            ConditionKind::Read(c) => ("Read", *c as &dyn Condition),
        };
        f.debug_struct(name)
            .field("id", &cond.condition_id())
            .field("trigger_value", &cond.get_trigger_value())
            .finish()
    }
}

impl std::fmt::Debug for dyn Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&self.kind(), f)
    }
}

/// Status mask bits for StatusCondition
///
/// Per DDS v1.4 spec section 2.2.4.1 - Communication Status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusMask(u32);

impl StatusMask {
    /// No status enabled
    pub const NONE: StatusMask = StatusMask(0);

    /// All statuses enabled
    pub const ALL: StatusMask = StatusMask(0xFFFFFFFF);

    /// Data available to read (DataReader)
    pub const DATA_AVAILABLE: StatusMask = StatusMask(1 << 0);

    /// Sample lost (DataReader)
    pub const SAMPLE_LOST: StatusMask = StatusMask(1 << 1);

    /// Sample rejected (DataReader)
    pub const SAMPLE_REJECTED: StatusMask = StatusMask(1 << 2);

    /// Liveliness changed (DataReader)
    pub const LIVELINESS_CHANGED: StatusMask = StatusMask(1 << 3);

    /// Requested deadline missed (DataReader)
    pub const REQUESTED_DEADLINE_MISSED: StatusMask = StatusMask(1 << 4);

    /// Requested incompatible QoS (DataReader)
    pub const REQUESTED_INCOMPATIBLE_QOS: StatusMask = StatusMask(1 << 5);

    /// Subscription matched (DataReader)
    pub const SUBSCRIPTION_MATCHED: StatusMask = StatusMask(1 << 6);

    /// Liveliness lost (DataWriter)
    pub const LIVELINESS_LOST: StatusMask = StatusMask(1 << 7);

    /// Offered deadline missed (DataWriter)
    pub const OFFERED_DEADLINE_MISSED: StatusMask = StatusMask(1 << 8);

    /// Offered incompatible QoS (DataWriter)
    pub const OFFERED_INCOMPATIBLE_QOS: StatusMask = StatusMask(1 << 9);

    /// Publication matched (DataWriter)
    pub const PUBLICATION_MATCHED: StatusMask = StatusMask(1 << 10);

    /// Create a new StatusMask from raw bits
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        StatusMask(bits)
    }

    /// Get the raw bits value
    #[must_use]
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Check if this mask contains the given status
    #[must_use]
    pub const fn contains(&self, other: StatusMask) -> bool {
        (self.0 & other.0) == other.0
    }

    /// `true` when no bit is set
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Combine two masks with bitwise OR
    #[must_use]
    pub const fn or(self, other: StatusMask) -> Self {
        StatusMask(self.0 | other.0)
    }

    /// Intersect two masks with bitwise AND
    #[must_use]
    pub const fn and(self, other: StatusMask) -> Self {
        StatusMask(self.0 & other.0)
    }
}

impl std::ops::BitOr for StatusMask {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        self.or(rhs)
    }
}

impl std::ops::BitAnd for StatusMask {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        self.and(rhs)
    }
}

/// StatusCondition - condition based on Entity communication status
///
/// Per DDS v1.4 spec section 2.2.4.1.4:
/// "A StatusCondition object is associated with each Entity. The trigger_value
/// is determined by the communication statuses of that Entity."
pub struct StatusCondition {
    /// Enabled status mask - which statuses to monitor
    enabled_statuses: AtomicU32,

    /// Current active statuses (set by entity when status changes)
    active_statuses: AtomicU32,

    notifier: ConditionNotifier,
}

impl StatusCondition {
    /// Create a new StatusCondition
    ///
    /// By default, no statuses are enabled (must call `set_enabled_statuses`)
    #[must_use]
    pub fn new() -> Self {
        Self {
            enabled_statuses: AtomicU32::new(StatusMask::NONE.bits()),
            active_statuses: AtomicU32::new(StatusMask::NONE.bits()),
            notifier: ConditionNotifier::new(),
        }
    }

    /// Set which statuses this condition should monitor
    ///
    /// # Example
    ///
    /// ```
    /// use hdds_waitset::dds::{StatusCondition, StatusMask};
    ///
    /// let condition = StatusCondition::new();
    /// condition.set_enabled_statuses(
    ///     StatusMask::DATA_AVAILABLE | StatusMask::LIVELINESS_CHANGED
    /// );
    /// ```
    pub fn set_enabled_statuses(&self, mask: StatusMask) {
        let previous = self.enabled_statuses.swap(mask.bits(), Ordering::SeqCst);
        let active = self.active_statuses.load(Ordering::SeqCst);
        self.notify_if_changed(previous & active != 0, mask.bits() & active != 0);
    }

    /// Get the currently enabled statuses
    pub fn get_enabled_statuses(&self) -> StatusMask {
        StatusMask(self.enabled_statuses.load(Ordering::SeqCst))
    }

    /// Replace the active statuses (called by the owning Entity when its
    /// communication status changes)
    pub fn set_active_statuses(&self, mask: StatusMask) {
        let previous = self.active_statuses.swap(mask.bits(), Ordering::SeqCst);
        let enabled = self.enabled_statuses.load(Ordering::SeqCst);
        self.notify_if_changed(previous & enabled != 0, mask.bits() & enabled != 0);
    }

    /// Raise additional active statuses, keeping the ones already set
    pub fn add_active_statuses(&self, mask: StatusMask) {
        let previous = self.active_statuses.fetch_or(mask.bits(), Ordering::SeqCst);
        let enabled = self.enabled_statuses.load(Ordering::SeqCst);
        self.notify_if_changed(
            previous & enabled != 0,
            (previous | mask.bits()) & enabled != 0,
        );
    }

    /// Get the currently active statuses
    pub fn get_active_statuses(&self) -> StatusMask {
        StatusMask(self.active_statuses.load(Ordering::SeqCst))
    }

    /// Clear active statuses (called after the entity's status was read)
    pub fn clear_active_statuses(&self) {
        self.set_active_statuses(StatusMask::NONE);
    }

    fn notify_if_changed(&self, before: bool, after: bool) {
        if before != after {
            log::trace!(
                "[condition] StatusCondition id={} trigger {} -> {}",
                self.condition_id(),
                before,
                after
            );
            self.notifier.notify();
        }
    }
}

impl sealed::Sealed for StatusCondition {}

impl Condition for StatusCondition {
    fn get_trigger_value(&self) -> bool {
        let enabled = self.get_enabled_statuses();
        let active = self.get_active_statuses();

        // Trigger is true if any enabled status is active
        !enabled.and(active).is_empty()
    }

    fn notifier(&self) -> &ConditionNotifier {
        &self.notifier
    }

    fn kind(&self) -> ConditionKind<'_> {
        ConditionKind::Status(self)
    }
}

impl Default for StatusCondition {
    fn default() -> Self {
        Self::new()
    }
}

/// GuardCondition - manually-triggered condition
///
/// Per DDS v1.4 spec section 2.2.4.1.5:
/// "A GuardCondition is a Condition whose trigger_value is under the control
/// of the application."
pub struct GuardCondition {
    /// Trigger value (controlled by application)
    trigger_value: AtomicBool,

    notifier: ConditionNotifier,
}

impl GuardCondition {
    /// Create a new GuardCondition with trigger_value = false
    #[must_use]
    pub fn new() -> Self {
        Self {
            trigger_value: AtomicBool::new(false),
            notifier: ConditionNotifier::new(),
        }
    }

    /// Set the trigger value
    ///
    /// Every transition wakes the WaitSets this guard is attached to.
    ///
    /// # Example
    ///
    /// ```
    /// use hdds_waitset::dds::GuardCondition;
    ///
    /// let guard = GuardCondition::new();
    /// guard.set_trigger_value(true);  // Wake up WaitSet
    /// ```
    pub fn set_trigger_value(&self, value: bool) {
        let previous = self.trigger_value.swap(value, Ordering::SeqCst);
        if previous != value {
            self.notifier.notify();
        }
    }

    /// Flip the value without notifying (simulates a missed notification).
    #[cfg(test)]
    pub(crate) fn set_trigger_value_silently(&self, value: bool) {
        self.trigger_value.store(value, Ordering::SeqCst);
    }
}

impl sealed::Sealed for GuardCondition {}

impl Condition for GuardCondition {
    fn get_trigger_value(&self) -> bool {
        self.trigger_value.load(Ordering::SeqCst)
    }

    fn notifier(&self) -> &ConditionNotifier {
        &self.notifier
    }

    fn kind(&self) -> ConditionKind<'_> {
        ConditionKind::Guard(self)
    }
}

impl Default for GuardCondition {
    fn default() -> Self {
        Self::new()
    }
}

impl sealed::Sealed for ReadCondition {}

/// Trait for entities that have a StatusCondition (DataReader, DataWriter).
///
/// This trait enables the convenience method `WaitSet::attach(&entity)`.
///
/// # Example
/// ```ignore
/// let waitset = WaitSet::new();
/// waitset.attach(&reader);  // Convenience - calls get_status_condition() internally
/// ```
pub trait HasStatusCondition {
    /// Get the StatusCondition associated with this entity.
    fn get_status_condition(&self) -> Arc<StatusCondition>;
}
