// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! DDS `Duration_t` used for `WaitSet::wait` timeouts.

/// Duration with seconds and nanoseconds (DDS Duration_t)
///
/// `INFINITE` uses the standard DDS representation
/// `{ 0x7FFFFFFF, 0xFFFFFFFF }` and disables the wait deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Duration {
    /// Whole seconds (negative values are treated as zero)
    pub seconds: i32,
    /// Nanoseconds within the second
    pub nanoseconds: u32,
}

impl Duration {
    /// Infinite duration (no deadline)
    pub const INFINITE: Self = Self {
        seconds: 0x7FFF_FFFF,
        nanoseconds: 0xFFFF_FFFF,
    };

    /// Zero duration
    pub const ZERO: Self = Self {
        seconds: 0,
        nanoseconds: 0,
    };

    /// Build from whole seconds.
    #[must_use]
    pub const fn from_secs(seconds: i32) -> Self {
        Self {
            seconds,
            nanoseconds: 0,
        }
    }

    /// Build from milliseconds.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        let seconds = millis / 1_000;
        if seconds >= Self::INFINITE.seconds as u64 {
            return Self::INFINITE;
        }
        Self {
            seconds: seconds as i32,
            nanoseconds: ((millis % 1_000) * 1_000_000) as u32,
        }
    }

    /// `true` for the infinite sentinel.
    #[must_use]
    pub const fn is_infinite(&self) -> bool {
        self.seconds == Self::INFINITE.seconds && self.nanoseconds == Self::INFINITE.nanoseconds
    }

    /// Convert to a `std::time::Duration`; `None` means no deadline.
    ///
    /// Negative values clamp to zero.
    #[must_use]
    pub fn to_std(&self) -> Option<std::time::Duration> {
        if self.is_infinite() {
            return None;
        }
        if self.seconds < 0 {
            return Some(std::time::Duration::ZERO);
        }
        let secs = std::time::Duration::from_secs(self.seconds.unsigned_abs().into());
        Some(secs + std::time::Duration::from_nanos(self.nanoseconds.into()))
    }
}

impl From<std::time::Duration> for Duration {
    fn from(value: std::time::Duration) -> Self {
        match i32::try_from(value.as_secs()) {
            Ok(seconds) if seconds < Self::INFINITE.seconds => Self {
                seconds,
                nanoseconds: value.subsec_nanos(),
            },
            _ => Self::INFINITE,
        }
    }
}

impl Default for Duration {
    fn default() -> Self {
        Self::INFINITE
    }
}
