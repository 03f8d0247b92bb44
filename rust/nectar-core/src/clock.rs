// Clock - Host time source
use crate::types::{Duration, Timestamp};
use chrono::Utc;
use std::cell::Cell;

/// Supplies the current time in seconds since the Unix epoch
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        // Pre-1970 clocks read as zero
        Utc::now().timestamp().max(0) as Timestamp
    }
}

/// Clock that only moves when told to, never backwards
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Cell<Timestamp>,
}

impl ManualClock {
    pub fn new(now: Timestamp) -> Self {
        Self { now: Cell::new(now) }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get().saturating_add(by));
    }

    /// Moves to `at`; earlier instants are ignored
    pub fn set(&self, at: Timestamp) {
        if at > self.now.get() {
            self.now.set(at);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_is_monotone() {
        let clock = ManualClock::new(100);
        clock.advance(50);
        assert_eq!(clock.now(), 150);

        clock.set(120);
        assert_eq!(clock.now(), 150);
        clock.set(900);
        assert_eq!(clock.now(), 900);
    }

    #[test]
    fn test_system_clock_after_2020() {
        assert!(SystemClock.now() > 1_577_836_800);
    }
}
