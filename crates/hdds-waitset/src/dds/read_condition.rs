// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! ReadCondition for DataReader data-available events

use super::condition::{Condition, ConditionKind, ConditionNotifier};
use std::sync::atomic::{AtomicU64, Ordering};

/// ReadCondition - true while the owning reader holds unconsumed samples
///
/// The reader reports arrivals with [`ReadCondition::add_samples`] and
/// consumption with [`ReadCondition::take_samples`]; the condition keeps the
/// pending count and wakes attached WaitSets when it crosses zero.
///
/// # Example
///
/// ```
/// use hdds_waitset::dds::{Condition, ReadCondition};
///
/// let cond = ReadCondition::new();
/// cond.add_samples(3);
/// assert!(cond.get_trigger_value());
/// assert_eq!(cond.take_samples(5), 3);
/// assert!(!cond.get_trigger_value());
/// ```
pub struct ReadCondition {
    /// Samples available and not yet taken (updated by DataReader)
    pending: AtomicU64,

    notifier: ConditionNotifier,
}

impl ReadCondition {
    /// Create a ReadCondition with no pending samples.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: AtomicU64::new(0),
            notifier: ConditionNotifier::new(),
        }
    }

    /// Number of samples not yet taken.
    pub fn pending_samples(&self) -> u64 {
        self.pending.load(Ordering::SeqCst)
    }

    /// Record `count` newly received samples.
    pub fn add_samples(&self, count: u64) {
        if count == 0 {
            return;
        }
        let previous = self
            .pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |p| {
                Some(p.saturating_add(count))
            })
            .unwrap_or_else(|p| p);
        self.notify_if_changed(previous, previous.saturating_add(count));
    }

    /// Consume up to `count` samples; returns how many were taken.
    pub fn take_samples(&self, count: u64) -> u64 {
        let previous = self
            .pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |p| {
                Some(p.saturating_sub(count))
            })
            .unwrap_or_else(|p| p);
        let taken = previous.min(count);
        self.notify_if_changed(previous, previous - taken);
        taken
    }

    /// Drop every pending sample (reader history purged).
    pub fn clear(&self) {
        let previous = self.pending.swap(0, Ordering::SeqCst);
        self.notify_if_changed(previous, 0);
    }

    fn notify_if_changed(&self, before: u64, after: u64) {
        if (before > 0) != (after > 0) {
            log::trace!(
                "[condition] ReadCondition id={} pending {} -> {}",
                self.condition_id(),
                before,
                after
            );
            self.notifier.notify();
        }
    }
}

impl Condition for ReadCondition {
    fn get_trigger_value(&self) -> bool {
        self.pending_samples() > 0
    }

    fn notifier(&self) -> &ConditionNotifier {
        &self.notifier
    }

    fn kind(&self) -> ConditionKind<'_> {
        ConditionKind::Read(self)
    }
}

impl Default for ReadCondition {
    fn default() -> Self {
        Self::new()
    }
}
