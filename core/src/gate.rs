use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// Single-slot action gate: at most one accepted invocation per window.
/// Calls inside the window are dropped, not queued. Replaces the ad-hoc
/// last-call-timestamp closures that used to guard reactions and replies.
pub struct ActionGate {
    last: Mutex<Option<Instant>>,
    window: Duration,
}

impl ActionGate {
    pub fn new(window: Duration) -> Self {
        Self {
            last: Mutex::new(None),
            window,
        }
    }

    /// Returns true if the action may fire now; false while the window from
    /// the last accepted call is still open.
    pub fn try_fire(&self) -> bool {
        let mut guard = self.last.lock();
        let now = Instant::now();
        let open = match *guard {
            Some(prev) => now.duration_since(prev) >= self.window,
            None => true,
        };
        if open {
            *guard = Some(now);
        }
        open
    }
}
