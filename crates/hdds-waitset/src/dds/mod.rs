// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # DDS Conditions and WaitSets
//!
//! This module contains the wait/notify triad used by HDDS entities:
//!
//! - **Condition**: boolean-valued predicate owned by a domain entity
//!   ([`GuardCondition`], [`StatusCondition`], [`ReadCondition`])
//! - **ConditionNotifier**: per-condition registry of interested WaitSets
//! - **WaitSet**: blocks one thread until any attached Condition is true
//!
//! ## Quick Start
//!
//! ```rust
//! use hdds_waitset::dds::{Duration, GuardCondition, WaitSet};
//! use std::sync::Arc;
//!
//! let waitset = WaitSet::new();
//! let guard = Arc::new(GuardCondition::new());
//! waitset.attach_condition(guard.clone());
//!
//! guard.set_trigger_value(true);
//! let active = waitset.wait(Duration::from_millis(100))?;
//! assert_eq!(active.len(), 1);
//! # Ok::<(), hdds_waitset::Error>(())
//! ```
//!
//! ## Ownership
//!
//! ```text
//! Entity --owns--> Condition --owns--> ConditionNotifier
//!                      ^                      |
//!                      | Weak                 | Weak
//!                      |                      v
//!                  WaitSet  <-----------------+
//! ```
//!
//! Neither direction keeps the other alive. Dropping a Condition sends a
//! deletion notice to every WaitSet it is attached to; dropping a WaitSet
//! detaches it from every notifier.

mod condition;
mod duration;
mod read_condition;
mod waitset;

pub use condition::{
    Condition, ConditionKind, ConditionNotifier, GuardCondition, HasStatusCondition,
    StatusCondition, StatusMask, WaitsetSignal,
};
pub use duration::Duration;
pub use read_condition::ReadCondition;
pub use waitset::WaitSet;

/// Errors returned by HDDS condition and waitset operations.
///
/// Every variant maps onto exactly one [`ReturnCode`]. None of them is
/// fatal: callers are expected to branch on them, `Timeout` in particular.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Operation is not valid in the current state (detach of an unattached
    /// condition, reentrant `wait()`).
    PreconditionNotMet(&'static str),
    /// `wait()` deadline elapsed with no condition triggered.
    Timeout,
    /// Configuration value rejected (e.g. zero outage interval).
    InvalidConfig(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::PreconditionNotMet(msg) => write!(f, "Precondition not met: {}", msg),
            Error::Timeout => write!(f, "Wait timed out"),
            Error::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

/// Convenient alias for API results using the public `Error` type.
pub type Result<T> = core::result::Result<T, Error>;

/// Closed DDS return-code view of an operation outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnCode {
    /// Success.
    Ok,
    /// Generic failure.
    Error,
    /// Caller-correctable misuse.
    PreconditionNotMet,
    /// Deadline elapsed.
    Timeout,
}

impl ReturnCode {
    /// Collapse a `Result` into its return code.
    #[must_use]
    pub fn from_result<T>(result: &Result<T>) -> Self {
        match result {
            Ok(_) => ReturnCode::Ok,
            Err(err) => ReturnCode::from(err),
        }
    }

    /// `true` for [`ReturnCode::Ok`].
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, ReturnCode::Ok)
    }
}

impl From<&Error> for ReturnCode {
    fn from(err: &Error) -> Self {
        match err {
            Error::PreconditionNotMet(_) => ReturnCode::PreconditionNotMet,
            Error::Timeout => ReturnCode::Timeout,
            Error::InvalidConfig(_) => ReturnCode::Error,
        }
    }
}
