// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! WaitSet - blocking wait for Condition triggers
//!
//! A monitor (`parking_lot` mutex + condvar) guarding the attached entries,
//! the waiting flag and a notification counter. Notifiers bump the counter
//! through [`WaitsetSignal::wake_up`]; the waiter rescans its conditions only
//! when the counter moved, or when the periodic outage interval elapses.
//!
//! Lock discipline: the WaitSet lock is never held while calling into a
//! Condition or its notifier, nor while an `Arc<dyn Condition>` may be
//! dropped (dropping the last reference sends a deletion notice that takes
//! this same lock).
//!
//! A second, outer `registration` lock serializes attach/detach so the entry
//! list and the notifier registrations change together. It is taken before
//! the monitor lock and never on the notify or deletion paths.

use super::condition::{Condition, HasStatusCondition, WaitsetSignal};
use super::{Duration, Error, Result};
use crate::config::{self, WaitSetConfig};
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Instant;

/// WaitSet - wait for multiple conditions
///
/// A WaitSet allows one thread at a time to block until at least one
/// attached Condition has `trigger_value == true`.
///
/// Conditions are held weakly: attaching does not keep a condition alive,
/// and a condition dropped while attached is removed automatically.
pub struct WaitSet {
    inner: Arc<WaitSetInner>,
}

struct WaitSetInner {
    id: u64,
    outage_interval: std::time::Duration,
    /// Held across an entry update and the matching notifier update.
    registration: Mutex<()>,
    state: Mutex<WaitState>,
    cond: Condvar,
}

struct WaitState {
    /// Insertion-ordered, duplicate-free.
    entries: Vec<ConditionEntry>,
    is_waiting: bool,
    notifications: u64,
}

#[derive(Clone)]
struct ConditionEntry {
    id: u64,
    condition: Weak<dyn Condition>,
}

impl WaitState {
    fn position(&self, condition_id: u64) -> Option<usize> {
        self.entries.iter().position(|e| e.id == condition_id)
    }
}

type ActiveConditions = Vec<Arc<dyn Condition>>;

impl WaitSet {
    /// Create a new WaitSet using the process-wide [`config::current`].
    #[must_use]
    pub fn new() -> Self {
        Self::from_valid_config(config::current())
    }

    /// Create a new WaitSet with an explicit configuration.
    pub fn with_config(config: WaitSetConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: WaitSetConfig) -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);

        Self {
            inner: Arc::new(WaitSetInner {
                id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
                outage_interval: config.outage_interval(),
                registration: Mutex::new(()),
                state: Mutex::new(WaitState {
                    entries: Vec::new(),
                    is_waiting: false,
                    notifications: 0,
                }),
                cond: Condvar::new(),
            }),
        }
    }

    /// Attach a Condition to this WaitSet
    ///
    /// Attaching a condition that is already attached replaces its entry in
    /// place. If a thread is currently blocked in [`WaitSet::wait`] and the
    /// condition is already triggered, that thread is woken immediately.
    pub fn attach_condition(&self, condition: Arc<dyn Condition>) {
        let condition_id = condition.condition_id();
        let entry = ConditionEntry {
            id: condition_id,
            condition: Arc::downgrade(&condition),
        };

        let _registration = self.inner.registration.lock();
        let was_there = {
            let mut state = self.inner.state.lock();
            match state.position(condition_id) {
                Some(index) => {
                    state.entries[index] = entry;
                    true
                }
                None => {
                    state.entries.push(entry);
                    false
                }
            }
        };

        if was_there {
            return;
        }

        log::debug!(
            "[waitset] id={} attach cond_id={}",
            self.inner.id,
            condition_id
        );
        condition.notifier().attach(&self.signal());

        if self.is_waiting() && condition.get_trigger_value() {
            self.inner.wake_up();
        }
    }

    /// Attach an entity's StatusCondition to this WaitSet (convenience method).
    ///
    /// Equivalent to `attach_condition(entity.get_status_condition())`.
    pub fn attach<E: HasStatusCondition>(&self, entity: &E) {
        self.attach_condition(entity.get_status_condition());
    }

    /// Detach a Condition from this WaitSet
    ///
    /// Returns [`Error::PreconditionNotMet`] if the condition is not attached;
    /// the WaitSet is left untouched in that case.
    pub fn detach_condition(&self, condition: &dyn Condition) -> Result<()> {
        let condition_id = condition.condition_id();

        let _registration = self.inner.registration.lock();
        let removed = {
            let mut state = self.inner.state.lock();
            state
                .position(condition_id)
                .map(|index| state.entries.remove(index))
        };

        if removed.is_none() {
            return Err(Error::PreconditionNotMet("condition not attached"));
        }

        condition.notifier().detach(self.inner.id);
        log::debug!(
            "[waitset] id={} detach cond_id={}",
            self.inner.id,
            condition_id
        );
        Ok(())
    }

    /// Get all attached Conditions, triggered or not, in attach order.
    #[must_use]
    pub fn get_conditions(&self) -> Vec<Arc<dyn Condition>> {
        let state = self.inner.state.lock();
        state
            .entries
            .iter()
            .filter_map(|entry| entry.condition.upgrade())
            .collect()
    }

    /// `true` if `condition` is attached.
    #[must_use]
    pub fn contains(&self, condition: &dyn Condition) -> bool {
        let condition_id = condition.condition_id();
        self.inner.state.lock().position(condition_id).is_some()
    }

    /// Number of attached conditions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.state.lock().entries.len()
    }

    /// `true` if no condition is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `true` while a thread is blocked in [`WaitSet::wait`].
    #[must_use]
    pub fn is_waiting(&self) -> bool {
        self.inner.state.lock().is_waiting
    }

    /// Wait until at least one Condition is triggered
    ///
    /// Returns the attached conditions whose trigger value is `true` at the
    /// moment of return, in attach order. [`Duration::INFINITE`] disables
    /// the deadline.
    ///
    /// # Errors
    ///
    /// - [`Error::PreconditionNotMet`] if another thread is already waiting
    ///   on this WaitSet (the other wait is not disturbed).
    /// - [`Error::Timeout`] if the deadline elapsed with nothing triggered.
    pub fn wait(&self, timeout: Duration) -> Result<Vec<Arc<dyn Condition>>> {
        let mut state = self.inner.state.lock();
        if state.is_waiting {
            log::debug!("[waitset] id={} reentrant wait rejected", self.inner.id);
            return Err(Error::PreconditionNotMet(
                "another thread is already waiting on this WaitSet",
            ));
        }

        log::debug!(
            "[waitset] id={} wait called timeout={:?}",
            self.inner.id,
            timeout
        );

        state.is_waiting = true;
        let deadline = timeout
            .to_std()
            .and_then(|timeout| Instant::now().checked_add(timeout));
        let result = self.inner.wait_locked(&mut state, deadline);
        state.is_waiting = false;
        drop(state);

        match &result {
            Ok(active) => log::debug!(
                "[waitset] id={} wait returning triggered_len={}",
                self.inner.id,
                active.len()
            ),
            Err(err) => log::debug!("[waitset] id={} wait returning {}", self.inner.id, err),
        }
        result
    }

    fn signal(&self) -> Arc<dyn WaitsetSignal> {
        Arc::clone(&self.inner) as Arc<dyn WaitsetSignal>
    }
}

impl WaitSetInner {
    fn wait_locked(
        &self,
        state: &mut MutexGuard<'_, WaitState>,
        deadline: Option<Instant>,
    ) -> Result<ActiveConditions> {
        // Differs from the counter so the first pass always scans.
        let mut observed = state.notifications.wrapping_sub(1);

        loop {
            if observed != state.notifications {
                let active = self.collect_active(state, &mut observed);
                if !active.is_empty() {
                    return Ok(active);
                }
            }

            let now = Instant::now();
            if deadline.is_some_and(|deadline| now >= deadline) {
                return Err(Error::Timeout);
            }

            let wake_at = match (now.checked_add(self.outage_interval), deadline) {
                (Some(outage), Some(deadline)) => Some(outage.min(deadline)),
                (outage, deadline) => outage.or(deadline),
            };

            let timed_out = match wake_at {
                Some(at) => self.cond.wait_until(state, at).timed_out(),
                None => {
                    self.cond.wait(state);
                    false
                }
            };

            if timed_out {
                // Outage or deadline: rescan even without a notification.
                observed = state.notifications.wrapping_sub(1);
            } else if observed == state.notifications {
                log::trace!("[waitset] id={} spurious wakeup", self.id);
            }
        }
    }

    /// Scan every entry for a true trigger value, outside the lock.
    ///
    /// Repeats until a scan completes without an interleaving notification
    /// or detach, so the result is never older than the last wake-up.
    fn collect_active(
        &self,
        state: &mut MutexGuard<'_, WaitState>,
        observed: &mut u64,
    ) -> ActiveConditions {
        loop {
            *observed = state.notifications;
            let entries = state.entries.clone();

            let active: ActiveConditions = MutexGuard::unlocked(state, || {
                entries
                    .iter()
                    .filter_map(|entry| entry.condition.upgrade())
                    .filter(|condition| condition.get_trigger_value())
                    .collect()
            });

            let settled = *observed == state.notifications || active.len() == state.entries.len();
            let still_attached = active
                .iter()
                .all(|condition| state.position(condition.condition_id()).is_some());

            if settled && still_attached {
                return active;
            }

            log::trace!("[waitset] id={} entries changed during scan, rescanning", self.id);
            MutexGuard::unlocked(state, || drop(active));
        }
    }
}

impl WaitsetSignal for WaitSetInner {
    fn id(&self) -> u64 {
        self.id
    }

    fn wake_up(&self) {
        let mut state = self.state.lock();
        state.notifications = state.notifications.wrapping_add(1);
        self.cond.notify_one();
    }

    fn will_be_deleted(&self, condition_id: u64) {
        let mut state = self.state.lock();
        if let Some(index) = state.position(condition_id) {
            state.entries.remove(index);
            log::debug!(
                "[waitset] id={} cond_id={} deleted while attached",
                self.id,
                condition_id
            );
        }
    }
}

impl Default for WaitSet {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for WaitSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("WaitSet")
            .field("id", &self.inner.id)
            .field("entries", &state.entries.len())
            .field("is_waiting", &state.is_waiting)
            .finish()
    }
}

impl Drop for WaitSet {
    fn drop(&mut self) {
        let entries = std::mem::take(&mut self.inner.state.lock().entries);
        for entry in entries {
            if let Some(condition) = entry.condition.upgrade() {
                condition.notifier().detach(self.inner.id);
            }
        }
    }
}
