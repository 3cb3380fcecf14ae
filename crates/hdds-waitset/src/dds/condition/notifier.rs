// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-condition fan-out registry of interested WaitSets.
//!
//! The registry is an `ArcSwap`ped snapshot: `notify()` loads it without
//! taking any lock, attach/detach publish a new copy. A notifier therefore
//! never holds a lock of its own while it calls into a WaitSet.

use arc_swap::ArcSwap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Wake-up endpoint a WaitSet hands to the notifiers of its conditions.
///
/// Notifiers only keep a weak reference to these handles; each handle is
/// identified by a stable id so it can be detached without upgrading.
pub trait WaitsetSignal: Send + Sync {
    /// Stable identifier of the WaitSet behind this signal.
    fn id(&self) -> u64;

    /// A condition this WaitSet is attached to may have changed.
    fn wake_up(&self);

    /// The condition `condition_id` is being destroyed.
    ///
    /// Implementations must drop their entry without calling back into the
    /// condition or its notifier.
    fn will_be_deleted(&self, condition_id: u64);
}

#[derive(Clone)]
struct WaitsetHook {
    id: u64,
    signal: Weak<dyn WaitsetSignal>,
}

/// Registry of the WaitSets interested in one condition.
///
/// Every condition owns exactly one notifier. The notifier id doubles as the
/// condition identity (see [`super::Condition::condition_id`]).
pub struct ConditionNotifier {
    condition_id: u64,
    hooks: ArcSwap<Vec<WaitsetHook>>,
}

impl ConditionNotifier {
    /// Create an empty notifier with a process-unique id.
    #[must_use]
    pub fn new() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self {
            condition_id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            hooks: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// Identity of the owning condition.
    #[must_use]
    pub fn condition_id(&self) -> u64 {
        self.condition_id
    }

    /// Register a WaitSet. Registering the same WaitSet twice is a no-op.
    pub fn attach(&self, signal: &Arc<dyn WaitsetSignal>) {
        let hook = WaitsetHook {
            id: signal.id(),
            signal: Arc::downgrade(signal),
        };

        self.hooks.rcu(|hooks| {
            let mut next: Vec<WaitsetHook> = hooks
                .iter()
                .filter(|h| h.signal.strong_count() > 0)
                .cloned()
                .collect();
            if !next.iter().any(|h| h.id == hook.id) {
                next.push(hook.clone());
            }
            next
        });

        log::debug!(
            "[notifier] attach waitset id={} cond_id={}",
            hook.id,
            self.condition_id
        );
    }

    /// Deregister a WaitSet. Unknown ids are ignored.
    pub fn detach(&self, signal_id: u64) {
        self.hooks.rcu(|hooks| {
            hooks
                .iter()
                .filter(|h| h.id != signal_id && h.signal.strong_count() > 0)
                .cloned()
                .collect::<Vec<_>>()
        });

        log::debug!(
            "[notifier] detach waitset id={} cond_id={}",
            signal_id,
            self.condition_id
        );
    }

    /// Wake every registered WaitSet.
    ///
    /// Must be called by the owning condition whenever its trigger value
    /// changes, before the state-changing call returns.
    pub fn notify(&self) {
        let hooks = self.hooks.load();
        let mut stale = false;

        for hook in hooks.iter() {
            match hook.signal.upgrade() {
                Some(signal) => signal.wake_up(),
                None => stale = true,
            }
        }

        log::trace!(
            "[notifier] cond_id={} woke {} waitset(s)",
            self.condition_id,
            hooks.len()
        );

        if stale {
            drop(hooks);
            self.prune();
        }
    }

    /// Number of live WaitSets registered with this notifier.
    #[must_use]
    pub fn attached_count(&self) -> usize {
        self.hooks
            .load()
            .iter()
            .filter(|h| h.signal.strong_count() > 0)
            .count()
    }

    fn prune(&self) {
        self.hooks.rcu(|hooks| {
            hooks
                .iter()
                .filter(|h| h.signal.strong_count() > 0)
                .cloned()
                .collect::<Vec<_>>()
        });
    }

    /// Send the deletion notice to every registered WaitSet.
    fn will_be_deleted(&self) {
        let hooks = self.hooks.swap(Arc::new(Vec::new()));
        for hook in hooks.iter() {
            if let Some(signal) = hook.signal.upgrade() {
                signal.will_be_deleted(self.condition_id);
            }
        }

        if !hooks.is_empty() {
            log::debug!(
                "[notifier] cond_id={} deleted while attached to {} waitset(s)",
                self.condition_id,
                hooks.len()
            );
        }
    }
}

impl Default for ConditionNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConditionNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConditionNotifier")
            .field("condition_id", &self.condition_id)
            .field("attached", &self.attached_count())
            .finish()
    }
}

// The notifier lives and dies with its condition, so dropping it is the
// condition's "about to be destroyed" hook.
impl Drop for ConditionNotifier {
    fn drop(&mut self) {
        self.will_be_deleted();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingSignal {
        id: u64,
        wakes: AtomicU64,
        deleted: Mutex<Vec<u64>>,
    }

    impl WaitsetSignal for RecordingSignal {
        fn id(&self) -> u64 {
            self.id
        }

        fn wake_up(&self) {
            self.wakes.fetch_add(1, Ordering::SeqCst);
        }

        fn will_be_deleted(&self, condition_id: u64) {
            self.deleted.lock().push(condition_id);
        }
    }

    fn signal(id: u64) -> (Arc<RecordingSignal>, Arc<dyn WaitsetSignal>) {
        let concrete = Arc::new(RecordingSignal {
            id,
            ..Default::default()
        });
        let erased: Arc<dyn WaitsetSignal> = concrete.clone();
        (concrete, erased)
    }

    #[test]
    fn test_attach_is_idempotent() {
        let notifier = ConditionNotifier::new();
        let (_concrete, erased) = signal(7);

        notifier.attach(&erased);
        notifier.attach(&erased);
        assert_eq!(notifier.attached_count(), 1);
    }

    #[test]
    fn test_notify_wakes_each_waitset_once() {
        let notifier = ConditionNotifier::new();
        let (a, a_dyn) = signal(1);
        let (b, b_dyn) = signal(2);

        notifier.attach(&a_dyn);
        notifier.attach(&b_dyn);
        notifier.notify();

        assert_eq!(a.wakes.load(Ordering::SeqCst), 1);
        assert_eq!(b.wakes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_detach_absent_is_noop() {
        let notifier = ConditionNotifier::new();
        let (a, a_dyn) = signal(1);
        notifier.attach(&a_dyn);

        notifier.detach(99);
        assert_eq!(notifier.attached_count(), 1);

        notifier.detach(1);
        notifier.notify();
        assert_eq!(notifier.attached_count(), 0);
        assert_eq!(a.wakes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_dropped_waitset_is_pruned() {
        let notifier = ConditionNotifier::new();
        let (a, a_dyn) = signal(1);
        notifier.attach(&a_dyn);

        drop(a_dyn);
        drop(a);
        notifier.notify();
        assert_eq!(notifier.attached_count(), 0);
    }

    #[test]
    fn test_drop_sends_deletion_notice() {
        let notifier = ConditionNotifier::new();
        let cond_id = notifier.condition_id();
        let (a, a_dyn) = signal(1);
        notifier.attach(&a_dyn);

        drop(notifier);
        assert_eq!(*a.deleted.lock(), vec![cond_id]);
        assert_eq!(a.wakes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_ids_unique() {
        let n1 = ConditionNotifier::new();
        let n2 = ConditionNotifier::new();
        assert_ne!(n1.condition_id(), n2.condition_id());
    }
}
