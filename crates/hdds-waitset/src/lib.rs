// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # HDDS WaitSet - Conditions, Notifiers and WaitSets
//!
//! The wait/notify subsystem of HDDS. Domain entities (readers, writers,
//! participants) own [`Condition`](dds::Condition)s and flip their trigger
//! values; applications attach those conditions to a [`WaitSet`] and block
//! a thread until any of them becomes true.
//!
//! ## Quick Start
//!
//! ```rust
//! use hdds_waitset::{Condition, Duration, GuardCondition, Result, WaitSet};
//! use std::sync::Arc;
//! use std::thread;
//!
//! fn main() -> Result<()> {
//!     let waitset = WaitSet::new();
//!     let shutdown = Arc::new(GuardCondition::new());
//!     waitset.attach_condition(shutdown.clone());
//!
//!     let trigger = Arc::clone(&shutdown);
//!     let handle = thread::spawn(move || trigger.set_trigger_value(true));
//!
//!     let active = waitset.wait(Duration::INFINITE)?;
//!     assert_eq!(active[0].condition_id(), shutdown.condition_id());
//!     handle.join().expect("trigger thread");
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +--------------------+   notify()   +---------------------+   wake_up()   +-----------+
//! | Condition          | -----------> | ConditionNotifier   | ------------> | WaitSet   |
//! | (Guard/Status/Read)|              | (Weak WaitSet hooks)|               | (monitor) |
//! +--------------------+              +---------------------+               +-----------+
//!           ^                                                                     |
//!           +------------------- get_trigger_value() (rescan) -------------------+
//! ```
//!
//! ## Modules Overview
//!
//! - [`dds`] - Conditions, notifier and WaitSet (start here)
//! - [`config`] - Outage interval and process-wide defaults
//!
//! ## Logging
//!
//! All diagnostics go through the [`log`] facade with bracketed component
//! prefixes (`[waitset]`, `[notifier]`, `[condition]`, `[config]`). The crate
//! installs no logger.

/// WaitSet configuration (outage interval, process-wide defaults).
pub mod config;
/// DDS conditions and WaitSets.
pub mod dds;

pub use config::WaitSetConfig;
pub use dds::{
    Condition, ConditionKind, ConditionNotifier, Duration, Error, GuardCondition,
    HasStatusCondition, ReadCondition, Result, ReturnCode, StatusCondition, StatusMask, WaitSet,
};

/// HDDS WaitSet version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
