//! Wall-clock sources.
//!
//! Expiry checks never read the system time directly. They take a [`Clock`]
//! so resolution stays deterministic under test.

use std::fmt;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

/// Source of the current Unix time in seconds.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current Unix time in seconds.
    fn now_unix(&self) -> i64;
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Clock pinned to a settable instant.
///
/// Also counts how many times it was read, which lets tests assert that an
/// expiry check did or did not run.
#[derive(Debug, Default)]
pub struct FixedClock {
    now: AtomicI64,
    reads: AtomicUsize,
}

impl FixedClock {
    /// Create a clock pinned at `now` (Unix seconds).
    #[must_use]
    pub fn new(now: i64) -> Self {
        Self {
            now: AtomicI64::new(now),
            reads: AtomicUsize::new(0),
        }
    }

    /// Move the clock to `now`.
    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Move the clock forward by `seconds`.
    pub fn advance(&self, seconds: i64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }

    /// Number of `now_unix` calls so far.
    #[must_use]
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl Clock for FixedClock {
    fn now_unix(&self) -> i64 {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.now.load(Ordering::SeqCst)
    }
}
