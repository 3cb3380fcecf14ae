// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test/bench code readability over pedantic
#![allow(clippy::missing_panics_doc)] // Tests/examples panic on failure

/// WaitSet Example for HDDS
///
/// Demonstrates:
/// - Attaching Guard and Status conditions to a WaitSet
/// - Triggering them from worker threads
/// - Handling the active set returned by wait()
/// - Using a GuardCondition as a shutdown signal
///
/// Run with:
/// ```bash
/// cargo run -p hdds-waitset --example waitset_demo
/// ```
use hdds_waitset::{
    Condition, ConditionKind, Duration, Error, GuardCondition, StatusCondition, StatusMask,
    WaitSet,
};
use std::sync::Arc;
use std::thread;
use std::time::Duration as StdDuration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== HDDS WaitSet Example ===\n");

    let waitset = WaitSet::new();
    let shutdown = Arc::new(GuardCondition::new());
    let reader_status = Arc::new(StatusCondition::new());
    reader_status.set_enabled_statuses(StatusMask::DATA_AVAILABLE);

    waitset.attach_condition(shutdown.clone());
    waitset.attach_condition(reader_status.clone());
    println!("[OK] Attached {} conditions", waitset.len());

    let producer_status = Arc::clone(&reader_status);
    let producer = thread::spawn(move || {
        for _ in 0..3 {
            thread::sleep(StdDuration::from_millis(100));
            producer_status.add_active_statuses(StatusMask::DATA_AVAILABLE);
        }
    });

    let stopper = Arc::clone(&shutdown);
    let stopper_thread = thread::spawn(move || {
        thread::sleep(StdDuration::from_millis(600));
        stopper.set_trigger_value(true);
    });

    'outer: loop {
        let active = match waitset.wait(Duration::from_secs(1)) {
            Ok(active) => active,
            Err(Error::Timeout) => {
                println!("[..] Timeout, nothing triggered");
                continue;
            }
            Err(err) => return Err(err.into()),
        };

        for condition in &active {
            match condition.kind() {
                ConditionKind::Guard(_) => {
                    println!("[OK] Shutdown requested");
                    break 'outer;
                }
                ConditionKind::Status(status) => {
                    println!(
                        "[OK] Status active: 0x{:08x}",
                        status.get_active_statuses().bits()
                    );
                    status.clear_active_statuses();
                }
                ConditionKind::Read(_) => {}
            }
        }
    }

    producer.join().map_err(|_| "producer thread panicked")?;
    stopper_thread.join().map_err(|_| "stopper thread panicked")?;
    waitset.detach_condition(&*shutdown)?;
    println!("\n=== Done ({} condition still attached) ===", waitset.len());
    Ok(())
}
