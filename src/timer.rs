use std::time::{Duration, Instant};

use tracing::trace;

/// Cadence of the elapsed-time timer while a test runs.
pub const TICK_RATE_MS: u64 = 100;
/// Cadence of the live stats refresh while a test runs.
pub const STATS_REFRESH_MS: u64 = 800;

/// A cooperatively polled periodic task.
///
/// Nothing runs on its own: the owner calls [`PeriodicTask::poll`] and acts
/// when it returns true. A cancelled task never reports due again until it is
/// re-armed, so cancelling is synchronous.
#[derive(Debug, Clone)]
pub struct PeriodicTask {
    name: &'static str,
    interval: Duration,
    next_due: Option<Instant>,
}

impl PeriodicTask {
    pub fn new(name: &'static str, interval: Duration) -> Self {
        Self {
            name,
            interval,
            next_due: None,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.next_due.is_some()
    }

    pub fn arm(&mut self, now: Instant) {
        trace!(target: "timer", task = self.name, "arm");
        self.next_due = Some(now + self.interval);
    }

    pub fn cancel(&mut self) {
        if self.next_due.take().is_some() {
            trace!(target: "timer", task = self.name, "cancel");
        }
    }

    /// Returns true when the task is armed and due at `now`. Missed periods
    /// are collapsed into a single firing.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                let mut next = due + self.interval;
                if next <= now {
                    next = now + self.interval;
                }
                self.next_due = Some(next);
                true
            }
            _ => false,
        }
    }
}
