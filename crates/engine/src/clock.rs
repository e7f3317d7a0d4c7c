//! Clock abstraction for the update queue's debounce deadlines.
//!
//! In production the engine uses [`RealClock`]. Tests drive a
//! [`ManualClock`] so debounce behavior is deterministic.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

pub trait Clock {
    fn now(&self) -> Instant;
}

/// Real clock using std::time::Instant.
#[derive(Clone, Copy, Default)]
pub struct RealClock;

impl Clock for RealClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Hand-advanced clock. Clones share the same time.
#[derive(Clone)]
pub struct ManualClock {
    now: Rc<Cell<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Rc::new(Cell::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let a = ManualClock::new();
        let b = a.clone();
        let start = b.now();
        a.advance(Duration::from_millis(40));
        assert_eq!(b.now() - start, Duration::from_millis(40));
    }
}
