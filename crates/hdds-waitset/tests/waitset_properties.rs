// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test/bench code readability over pedantic
#![allow(clippy::missing_panics_doc)] // Tests/examples panic on failure
#![allow(clippy::too_many_lines)] // Example/test code

//! WaitSet behavioural tests through the public API
//!
//! Covers attach/detach bookkeeping, lost-wakeup immunity, timeout bounds,
//! freshness of the active set and lifetime of the Condition/WaitSet graph.

use hdds_waitset::{
    Condition, Duration, Error, GuardCondition, ReadCondition, ReturnCode, StatusCondition,
    StatusMask, WaitSet, WaitSetConfig,
};
use std::collections::BTreeSet;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration as StdDuration, Instant};

fn id_set(conditions: &[Arc<dyn Condition>]) -> BTreeSet<u64> {
    conditions.iter().map(|c| c.condition_id()).collect()
}

fn wait_until_blocked(ws: &WaitSet) {
    while !ws.is_waiting() {
        thread::yield_now();
    }
}

#[test]
fn detach_unattached_reports_precondition_not_met() {
    let ws = WaitSet::new();
    let guard = Arc::new(GuardCondition::new());

    let result = ws.detach_condition(&*guard);
    assert_eq!(ReturnCode::from_result(&result), ReturnCode::PreconditionNotMet);
    assert!(ws.is_empty());

    ws.attach_condition(guard.clone());
    ws.detach_condition(&*guard).expect("first detach");
    assert!(matches!(
        ws.detach_condition(&*guard),
        Err(Error::PreconditionNotMet(_))
    ));
}

#[test]
fn blocked_wait_sees_both_transitions() {
    let ws = Arc::new(WaitSet::new());
    let a = Arc::new(GuardCondition::new());
    let b = Arc::new(GuardCondition::new());
    ws.attach_condition(a.clone());
    ws.attach_condition(b.clone());

    let waiter_ws = Arc::clone(&ws);
    let waiter = thread::spawn(move || {
        let first = waiter_ws.wait(Duration::INFINITE).expect("first wait");
        let first_ids = id_set(&first);
        drop(first);
        let second = waiter_ws.wait(Duration::INFINITE).expect("second wait");
        (first_ids, id_set(&second))
    });

    wait_until_blocked(&ws);
    a.set_trigger_value(true);

    // A stays true, so the second wait returns at once.
    let (first, second) = waiter.join().expect("waiter thread");
    assert_eq!(first, BTreeSet::from([a.condition_id()]));
    assert!(second.contains(&a.condition_id()));

    b.set_trigger_value(true);
    let both = ws.wait(Duration::INFINITE).expect("third wait");
    assert_eq!(id_set(&both), BTreeSet::from([a.condition_id(), b.condition_id()]));
}

#[test]
fn notify_before_wait_is_never_lost() {
    for _ in 0..200 {
        let ws = Arc::new(WaitSet::new());
        let guard = Arc::new(GuardCondition::new());
        ws.attach_condition(guard.clone());

        let barrier = Arc::new(Barrier::new(2));
        let setter_barrier = Arc::clone(&barrier);
        let setter_guard = Arc::clone(&guard);
        let setter = thread::spawn(move || {
            setter_barrier.wait();
            if fastrand::bool() {
                thread::yield_now();
            }
            setter_guard.set_trigger_value(true);
        });

        barrier.wait();
        let start = Instant::now();
        let active = ws.wait(Duration::from_secs(5)).expect("no lost wakeup");
        assert_eq!(active.len(), 1);
        // Must not have needed an outage rescan.
        assert!(start.elapsed() < StdDuration::from_millis(400));
        setter.join().expect("setter thread");
    }
}

#[test]
fn timeout_is_bounded_by_one_outage() {
    let outage = StdDuration::from_millis(200);
    let ws = WaitSet::with_config(WaitSetConfig::new().with_outage_interval(outage))
        .expect("valid config");
    let guard = Arc::new(GuardCondition::new());
    ws.attach_condition(guard.clone());

    for timeout_ms in [0_u64, 30, 150, 350] {
        let start = Instant::now();
        let result = ws.wait(Duration::from_millis(timeout_ms));
        let elapsed = start.elapsed();

        assert_eq!(result.unwrap_err(), Error::Timeout);
        assert!(elapsed >= StdDuration::from_millis(timeout_ms));
        assert!(
            elapsed <= StdDuration::from_millis(timeout_ms) + outage + StdDuration::from_millis(100),
            "timeout {}ms took {:?}",
            timeout_ms,
            elapsed
        );
    }
}

#[test]
fn active_set_matches_trigger_values() {
    let ws = WaitSet::new();
    let conditions: Vec<Arc<GuardCondition>> =
        (0..6).map(|_| Arc::new(GuardCondition::new())).collect();
    for cond in &conditions {
        ws.attach_condition(cond.clone());
    }

    let mut rng = fastrand::Rng::with_seed(0x5eed);
    for _ in 0..64 {
        for cond in &conditions {
            cond.set_trigger_value(rng.bool());
        }
        let expected: BTreeSet<u64> = conditions
            .iter()
            .filter(|c| c.get_trigger_value())
            .map(|c| c.condition_id())
            .collect();

        match ws.wait(Duration::ZERO) {
            Ok(active) => assert_eq!(id_set(&active), expected),
            Err(Error::Timeout) => assert!(expected.is_empty()),
            Err(other) => panic!("unexpected error {}", other),
        }
    }
}

#[test]
fn mixed_condition_kinds() {
    let ws = WaitSet::new();
    let guard = Arc::new(GuardCondition::new());
    let status = Arc::new(StatusCondition::new());
    let read = Arc::new(ReadCondition::new());

    status.set_enabled_statuses(StatusMask::DATA_AVAILABLE);
    ws.attach_condition(guard.clone());
    ws.attach_condition(status.clone());
    ws.attach_condition(read.clone());

    status.set_active_statuses(StatusMask::DATA_AVAILABLE);
    read.add_samples(1);

    let active = ws.wait(Duration::from_millis(100)).expect("wait");
    assert_eq!(
        id_set(&active),
        BTreeSet::from([status.condition_id(), read.condition_id()])
    );
}

#[test]
fn dropped_waitset_is_not_touched_by_notify() {
    let guard = Arc::new(GuardCondition::new());
    let status = Arc::new(StatusCondition::new());
    status.set_enabled_statuses(StatusMask::ALL);

    for _ in 0..16 {
        let ws = WaitSet::new();
        ws.attach_condition(guard.clone());
        ws.attach_condition(status.clone());
    }

    assert_eq!(guard.notifier().attached_count(), 0);
    assert_eq!(status.notifier().attached_count(), 0);

    guard.set_trigger_value(true);
    status.set_active_statuses(StatusMask::SAMPLE_LOST);
    guard.notifier().notify();
}

#[test]
fn condition_dropped_during_wait() {
    let ws = Arc::new(WaitSet::new());
    let doomed = Arc::new(GuardCondition::new());
    let survivor = Arc::new(GuardCondition::new());
    ws.attach_condition(doomed.clone());
    ws.attach_condition(survivor.clone());

    let waiter_ws = Arc::clone(&ws);
    let waiter = thread::spawn(move || waiter_ws.wait(Duration::from_secs(5)));

    wait_until_blocked(&ws);
    drop(doomed);
    survivor.set_trigger_value(true);

    let active = waiter.join().expect("waiter").expect("wait");
    assert_eq!(id_set(&active), BTreeSet::from([survivor.condition_id()]));
    drop(active);
    assert_eq!(ws.len(), 1);
}

#[test]
fn concurrent_attach_detach_and_notify() {
    let ws = Arc::new(WaitSet::new());
    let stop = Arc::new(GuardCondition::new());
    ws.attach_condition(stop.clone());

    let churners: Vec<_> = (0..4)
        .map(|seed| {
            let ws = Arc::clone(&ws);
            thread::spawn(move || {
                let mut rng = fastrand::Rng::with_seed(seed);
                let cond = Arc::new(GuardCondition::new());
                for _ in 0..500 {
                    match rng.u8(0..3) {
                        0 => ws.attach_condition(cond.clone()),
                        1 => {
                            let _ = ws.detach_condition(&*cond);
                        }
                        _ => cond.set_trigger_value(rng.bool()),
                    }
                }
                cond.set_trigger_value(false);
            })
        })
        .collect();

    for handle in churners {
        handle.join().expect("churner");
    }

    stop.set_trigger_value(true);
    let active = ws.wait(Duration::from_secs(1)).expect("stop seen");
    assert!(id_set(&active).contains(&stop.condition_id()));
}
