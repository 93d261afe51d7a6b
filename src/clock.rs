use std::sync::atomic::{AtomicU64, Ordering};

/// Source of wall-clock time in whole epoch seconds.
///
/// The rate limiter only ever sees time through this trait so window
/// arithmetic can be driven deterministically in tests.
pub trait Clock: Send + Sync {
    fn now_secs(&self) -> u64;
}

// Real wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> u64 {
        // pre-1970 clocks clamp to zero
        chrono::Utc::now().timestamp().max(0) as u64
    }
}

/// Settable clock for tests and simulations.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start: u64) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    pub fn set(&self, secs: u64) {
        self.now.store(secs, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_secs(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}
