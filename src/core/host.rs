//! # Host boundary.
//!
//! The host owns the per-tick execution primitive: it re-enters every
//! registered [`Resumable`] once per tick until it reports
//! [`Step::Complete`]. The [`Driver`](crate::Driver) is the only component
//! that talks to it.
//!
//! [`FrameLoop`](crate::FrameLoop) is the built-in host; embedders with their
//! own frame loop implement [`Host`] instead.

use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::tasks::Step;

/// A cycle the host re-enters once per tick.
pub trait Resumable {
    /// Runs until the next suspension point.
    ///
    /// Returning [`Step::Complete`] removes the cycle from the host.
    fn resume(&mut self) -> Step;
}

/// Per-tick execution primitive consumed by the driver.
pub trait Host {
    /// Schedules `cycle` for re-entry once per tick, starting with the next
    /// tick. Must never resume the cycle inline.
    fn register(&self, cycle: Box<dyn Resumable>);

    /// Monotonic clock of this host.
    fn clock(&self) -> Rc<dyn Clock>;
}

/// Monotonic time source.
pub trait Clock {
    /// Time elapsed since the clock's origin.
    fn now(&self) -> Duration;
}

/// Wall-clock backed [`Clock`] starting at construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// [`Clock`] advanced explicitly, for hosts with their own notion of frame
/// time and for tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: std::cell::Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    /// Sets the current time. Going backwards is clamped to the current value.
    pub fn set(&self, now: Duration) {
        self.now.set(self.now.get().max(now));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_is_monotonic() {
        let clock = ManualClock::new();
        clock.advance(Duration::from_millis(10));
        clock.set(Duration::from_millis(5));
        assert_eq!(clock.now(), Duration::from_millis(10));
        clock.set(Duration::from_millis(30));
        assert_eq!(clock.now(), Duration::from_millis(30));
    }

    #[test]
    fn monotonic_clock_moves_forward() {
        let clock = MonotonicClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
