//! Capture-time timestamps.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

/// Epoch-millisecond clock that never goes backwards within a session.
///
/// Wall-clock adjustments can move `Utc::now()` backwards; records keep the
/// highest timestamp handed out so far instead.
#[derive(Debug, Default)]
pub struct SessionClock {
    last: AtomicI64,
}

impl SessionClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current epoch milliseconds, clamped to be non-decreasing.
    pub fn now_ms(&self) -> i64 {
        self.observe(Utc::now().timestamp_millis())
    }

    fn observe(&self, now: i64) -> i64 {
        let previous = self.last.fetch_max(now, Ordering::SeqCst);
        previous.max(now)
    }
}
