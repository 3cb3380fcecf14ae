// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! WaitSet configuration.
//!
//! # Architecture
//!
//! - **Level 1 (Static)**: compile-time defaults (`MISSING_NOTIFICATION_OUTAGE`)
//! - **Level 2 (Dynamic)**: process-wide [`WaitSetConfig`] held in an `ArcSwap`,
//!   seeded from the environment on first use and read lock-free by
//!   [`crate::dds::WaitSet::new`]
//!
//! # Example
//!
//! ```
//! use hdds_waitset::config::{self, WaitSetConfig};
//! use std::time::Duration;
//!
//! let tuned = WaitSetConfig::new().with_outage_interval(Duration::from_millis(100));
//! config::set_default(tuned)?;
//! assert_eq!(config::current().outage_interval(), Duration::from_millis(100));
//! # config::set_default(WaitSetConfig::default())?;
//! # Ok::<(), hdds_waitset::Error>(())
//! ```

use crate::dds::{Error, Result};
use arc_swap::ArcSwap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Periodic re-check bound for a blocked `wait()`.
///
/// A waiter wakes at least this often even without a notification and
/// rescans its conditions.
pub const MISSING_NOTIFICATION_OUTAGE: Duration = Duration::from_millis(500);

/// Environment variable overriding the outage interval (milliseconds).
pub const OUTAGE_ENV_VAR: &str = "HDDS_WAITSET_OUTAGE_MS";

/// Largest accepted outage interval.
///
/// Keeps `Instant + interval` representable so a waiter always has a
/// periodic re-check, even with an infinite timeout.
pub const MAX_OUTAGE_INTERVAL: Duration = Duration::from_secs(3600);

/// Tunables for a [`crate::dds::WaitSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitSetConfig {
    outage_interval: Duration,
}

impl WaitSetConfig {
    /// Defaults (500 ms outage interval).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            outage_interval: MISSING_NOTIFICATION_OUTAGE,
        }
    }

    /// Defaults overridden by `HDDS_WAITSET_OUTAGE_MS` when set.
    ///
    /// Unparsable, zero or out-of-range values are ignored.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::new();
        if let Ok(raw) = std::env::var(OUTAGE_ENV_VAR) {
            match parse_outage_ms(&raw) {
                Some(interval) => config.outage_interval = interval,
                None => log::warn!(
                    "[config] ignoring {}={:?}, using {:?}",
                    OUTAGE_ENV_VAR,
                    raw,
                    MISSING_NOTIFICATION_OUTAGE
                ),
            }
        }
        config
    }

    /// Set the periodic re-check interval.
    #[must_use]
    pub const fn with_outage_interval(mut self, interval: Duration) -> Self {
        self.outage_interval = interval;
        self
    }

    /// Periodic re-check interval.
    #[must_use]
    pub const fn outage_interval(&self) -> Duration {
        self.outage_interval
    }

    /// Reject values a waiter cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.outage_interval.is_zero() {
            return Err(Error::InvalidConfig(
                "outage interval must be greater than zero".to_string(),
            ));
        }
        if self.outage_interval > MAX_OUTAGE_INTERVAL {
            return Err(Error::InvalidConfig(format!(
                "outage interval {:?} exceeds {:?}",
                self.outage_interval, MAX_OUTAGE_INTERVAL
            )));
        }
        Ok(())
    }
}

impl Default for WaitSetConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_outage_ms(raw: &str) -> Option<Duration> {
    let ms = raw.trim().parse::<u64>().ok()?;
    let interval = Duration::from_millis(ms);
    (ms > 0 && interval <= MAX_OUTAGE_INTERVAL).then_some(interval)
}

static DEFAULT_CONFIG: OnceLock<ArcSwap<WaitSetConfig>> = OnceLock::new();

fn default_slot() -> &'static ArcSwap<WaitSetConfig> {
    DEFAULT_CONFIG.get_or_init(|| ArcSwap::from_pointee(WaitSetConfig::from_env()))
}

/// Process-wide configuration used by `WaitSet::new()`.
#[must_use]
pub fn current() -> WaitSetConfig {
    **default_slot().load()
}

/// Replace the process-wide configuration.
///
/// Only WaitSets created afterwards pick up the new values.
pub fn set_default(config: WaitSetConfig) -> Result<()> {
    config.validate()?;
    default_slot().store(Arc::new(config));
    log::debug!("[config] default waitset config set to {:?}", config);
    Ok(())
}
