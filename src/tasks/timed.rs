//! # Time-driven progress routine.
//!
//! [`Timed`] calls its callback once per tick with the normalised elapsed
//! fraction of a fixed duration, measured on the host [`Clock`]. The clock is
//! read for the first time on the first advance, so time spent between
//! creation and the first tick does not count.
//!
//! The callback sees values in `[0, 1)`: the routine completes on the first
//! tick at or past the deadline without calling it. A zero duration completes
//! immediately.

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use crate::core::Clock;
use crate::tasks::{Routine, Step};

/// Calls `f(progress)` every tick until `total` elapsed.
pub struct Timed<F> {
    clock: Rc<dyn Clock>,
    total: Duration,
    deadline: Option<Duration>,
    f: F,
}

impl<F> Timed<F>
where
    F: FnMut(f32) + 'static,
{
    pub fn new(clock: Rc<dyn Clock>, total: Duration, f: F) -> Self {
        Self {
            clock,
            total,
            deadline: None,
            f,
        }
    }
}

impl<F> fmt::Debug for Timed<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timed")
            .field("total", &self.total)
            .field("deadline", &self.deadline)
            .finish()
    }
}

impl<F> Routine for Timed<F>
where
    F: FnMut(f32) + 'static,
{
    fn advance(&mut self) -> Step {
        let now = self.clock.now();
        let deadline = *self
            .deadline
            .get_or_insert_with(|| now.checked_add(self.total).unwrap_or(Duration::MAX));
        if now >= deadline {
            return Step::Complete;
        }
        let remaining = (deadline - now).as_secs_f32();
        let progress = 1.0 - remaining / self.total.as_secs_f32();
        (self.f)(progress.clamp(0.0, 1.0));
        Step::Yield
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::core::ManualClock;

    #[test]
    fn reports_linear_progress() {
        let clock = Rc::new(ManualClock::new());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let mut r = Timed::new(clock.clone(), Duration::from_millis(100), move |t| {
            s.borrow_mut().push((t * 100.0).round() as u32)
        });

        // construction time does not count
        clock.advance(Duration::from_secs(5));

        assert_eq!(r.advance(), Step::Yield);
        clock.advance(Duration::from_millis(25));
        assert_eq!(r.advance(), Step::Yield);
        clock.advance(Duration::from_millis(50));
        assert_eq!(r.advance(), Step::Yield);
        clock.advance(Duration::from_millis(25));
        assert_eq!(r.advance(), Step::Complete);

        assert_eq!(*seen.borrow(), vec![0, 25, 75]);
    }

    #[test]
    fn zero_duration_completes_without_callback() {
        let clock = Rc::new(ManualClock::new());
        let called = Rc::new(RefCell::new(false));
        let c = called.clone();
        let mut r = Timed::new(clock, Duration::ZERO, move |_| *c.borrow_mut() = true);
        assert_eq!(r.advance(), Step::Complete);
        assert!(!*called.borrow());
    }

    #[test]
    fn unbounded_duration_saturates() {
        let clock = Rc::new(ManualClock::new());
        clock.advance(Duration::from_secs(1));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let mut r = Timed::new(clock.clone(), Duration::MAX, move |t| s.borrow_mut().push(t));

        assert_eq!(r.advance(), Step::Yield);
        clock.advance(Duration::from_secs(3600));
        assert_eq!(r.advance(), Step::Yield);
        assert!(seen.borrow().iter().all(|t| (0.0..1.0).contains(t)));
    }
}
