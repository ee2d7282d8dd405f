use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{Local, NaiveDateTime, TimeDelta};

/// Source of wall-clock timestamps for session and response timing.
pub trait Clock: Clone + Send + Sync {
    fn now(&self) -> NaiveDateTime;

    /// Seconds elapsed since `since`, never negative.
    fn elapsed_secs(&self, since: NaiveDateTime) -> f64 {
        seconds_between(since, self.now())
    }
}

/// Seconds from `start` to `end`, clamped at zero when the clock went backwards.
pub fn seconds_between(start: NaiveDateTime, end: NaiveDateTime) -> f64 {
    let delta = end - start;
    match delta.num_microseconds() {
        Some(us) => (us as f64 / 1_000_000.0).max(0.0),
        None => (delta.num_milliseconds() as f64 / 1_000.0).max(0.0),
    }
}

/// Local wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock that only moves when told to. Clones share the same time, so a
/// test can hold one handle while the state machine owns another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<NaiveDateTime>>,
}

impl ManualClock {
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, d: Duration) {
        let step = TimeDelta::from_std(d).unwrap_or(TimeDelta::MAX);
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now = now.checked_add_signed(step).unwrap_or(*now);
    }

    pub fn set(&self, to: NaiveDateTime) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}
