//! Time source abstraction for token expiry.
//!
//! Token issuance and verification read the clock through `TimeSource` so
//! tests can pin the current instant and probe expiry boundaries exactly.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Abstraction over the wall clock.
pub trait TimeSource: Send + Sync {
    /// Get the current time in milliseconds since Unix epoch.
    fn now_ms(&self) -> u64;

    /// Get the current time in whole seconds since Unix epoch.
    fn now_secs(&self) -> u64 {
        self.now_ms() / 1000
    }
}

/// Real time source using the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    #[allow(clippy::cast_possible_truncation)] // Milliseconds won't overflow u64 for billions of years
    fn now_ms(&self) -> u64 {
        // Only fails if the system clock is set before 1970; treat that as the epoch.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |duration| duration.as_millis() as u64)
    }
}

/// A clock that only moves when told to.
///
/// Backed by an atomic so it can be shared with a `TokenCodec` behind an `Arc`
/// while the test keeps a handle to advance it.
#[derive(Debug)]
pub struct ManualTimeSource {
    current_time_ms: AtomicU64,
}

impl ManualTimeSource {
    #[must_use]
    pub const fn new(initial_time_ms: u64) -> Self {
        Self {
            current_time_ms: AtomicU64::new(initial_time_ms),
        }
    }

    /// Advance time by the given number of milliseconds, saturating at `u64::MAX`.
    pub fn advance(&self, ms: u64) {
        let current = self.current_time_ms.load(Ordering::SeqCst);
        self.current_time_ms
            .store(current.saturating_add(ms), Ordering::SeqCst);
    }

    /// Set the current time. May move time backwards.
    pub fn set(&self, time_ms: u64) {
        self.current_time_ms.store(time_ms, Ordering::SeqCst);
    }
}

impl TimeSource for ManualTimeSource {
    fn now_ms(&self) -> u64 {
        self.current_time_ms.load(Ordering::SeqCst)
    }
}
