//! # FrameLoop: built-in per-tick host.
//!
//! Keeps registered cycles in a run queue and re-enters each of them once per
//! call to [`FrameLoop::tick`].
//!
//! ## Tick structure
//! ```text
//! tick()
//!   ├─► admit cycles registered since the previous tick
//!   ├─► for each admitted cycle (registration order):
//!   │     resume() ─► Yield    → keep for the next tick
//!   │              └► Complete → drop
//!   └─► cycles registered during this tick wait for the next one
//! ```
//!
//! ## Rules
//! - A cycle is resumed **at most once** per tick
//! - Registration never resumes inline; the first resume is on the next tick
//! - Nested `tick()` calls (from inside a cycle or listener) are refused
//! - A cycle that panics is dropped; the tick goes on with the others

use std::cell::{Cell, RefCell};
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use crate::core::host::{Clock, Host, MonotonicClock, Resumable};
use crate::events::panic_message;
use crate::tasks::Step;

/// Cooperative run queue driven by explicit ticks.
pub struct FrameLoop {
    queue: RefCell<Vec<Box<dyn Resumable>>>,
    incoming: RefCell<Vec<Box<dyn Resumable>>>,
    ticks: Cell<u64>,
    in_tick: Cell<bool>,
    clock: Rc<dyn Clock>,
}

impl FrameLoop {
    /// Creates a loop timed by a [`MonotonicClock`].
    pub fn new() -> Rc<Self> {
        Self::with_clock(Rc::new(MonotonicClock::new()))
    }

    /// Creates a loop timed by `clock`.
    pub fn with_clock(clock: Rc<dyn Clock>) -> Rc<Self> {
        Rc::new(Self {
            queue: RefCell::new(Vec::new()),
            incoming: RefCell::new(Vec::new()),
            ticks: Cell::new(0),
            in_tick: Cell::new(false),
            clock,
        })
    }

    /// Runs one tick. Returns the number of cycles still scheduled afterwards.
    pub fn tick(&self) -> usize {
        if self.in_tick.replace(true) {
            tracing::warn!("nested FrameLoop::tick ignored");
            return self.pending();
        }

        let tick = self.ticks.get() + 1;
        self.ticks.set(tick);

        let mut current = mem::take(&mut *self.queue.borrow_mut());
        current.append(&mut self.incoming.borrow_mut());
        let admitted = current.len();

        current.retain_mut(|cycle| {
            match panic::catch_unwind(AssertUnwindSafe(|| cycle.resume())) {
                Ok(step) => step == Step::Yield,
                Err(payload) => {
                    let info = panic_message(payload.as_ref());
                    tracing::warn!(tick, %info, "cycle panicked; dropped from the loop");
                    false
                }
            }
        });
        tracing::trace!(tick, admitted, remaining = current.len(), "tick");

        *self.queue.borrow_mut() = current;
        self.in_tick.set(false);
        self.pending()
    }

    /// Ticks until no cycle is scheduled or `max` ticks ran. Returns the ticks run.
    pub fn run_until_idle(&self, max: u64) -> u64 {
        let mut ran = 0;
        while !self.is_idle() && ran < max {
            self.tick();
            ran += 1;
        }
        ran
    }

    /// Number of completed ticks.
    pub fn ticks(&self) -> u64 {
        self.ticks.get()
    }

    /// Cycles scheduled for the next tick.
    pub fn pending(&self) -> usize {
        self.queue.borrow().len() + self.incoming.borrow().len()
    }

    /// Returns `true` if nothing is scheduled.
    pub fn is_idle(&self) -> bool {
        self.pending() == 0
    }
}

impl Host for FrameLoop {
    fn register(&self, cycle: Box<dyn Resumable>) {
        self.incoming.borrow_mut().push(cycle);
    }

    fn clock(&self) -> Rc<dyn Clock> {
        Rc::clone(&self.clock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Countdown {
        left: u32,
        log: Rc<RefCell<Vec<(char, u32)>>>,
        name: char,
    }

    impl Resumable for Countdown {
        fn resume(&mut self) -> Step {
            self.log.borrow_mut().push((self.name, self.left));
            if self.left == 0 {
                return Step::Complete;
            }
            self.left -= 1;
            Step::Yield
        }
    }

    #[test]
    fn registration_waits_for_next_tick() {
        let frames = FrameLoop::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        frames.register(Box::new(Countdown {
            left: 1,
            log: log.clone(),
            name: 'a',
        }));
        assert!(log.borrow().is_empty());
        assert_eq!(frames.pending(), 1);

        assert_eq!(frames.tick(), 1);
        assert_eq!(frames.tick(), 0);
        assert_eq!(*log.borrow(), vec![('a', 1), ('a', 0)]);
        assert!(frames.is_idle());
        assert_eq!(frames.ticks(), 2);
    }

    #[test]
    fn resumes_in_registration_order() {
        let frames = FrameLoop::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for name in ['a', 'b'] {
            frames.register(Box::new(Countdown {
                left: 1,
                log: log.clone(),
                name,
            }));
        }
        frames.tick();
        assert_eq!(*log.borrow(), vec![('a', 1), ('b', 1)]);
    }

    struct Spawner {
        frames: Rc<FrameLoop>,
        log: Rc<RefCell<Vec<(char, u32)>>>,
    }

    impl Resumable for Spawner {
        fn resume(&mut self) -> Step {
            self.frames.register(Box::new(Countdown {
                left: 0,
                log: self.log.clone(),
                name: 'c',
            }));
            assert_eq!(self.frames.tick(), 1, "nested tick must be refused");
            Step::Complete
        }
    }

    #[test]
    fn registered_during_tick_runs_next_tick() {
        let frames = FrameLoop::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        frames.register(Box::new(Spawner {
            frames: frames.clone(),
            log: log.clone(),
        }));

        frames.tick();
        assert!(log.borrow().is_empty());
        assert_eq!(frames.pending(), 1);

        frames.tick();
        assert_eq!(*log.borrow(), vec![('c', 0)]);
    }

    #[test]
    fn run_until_idle_is_bounded() {
        let frames = FrameLoop::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        frames.register(Box::new(Countdown {
            left: 10,
            log,
            name: 'x',
        }));
        assert_eq!(frames.run_until_idle(3), 3);
        assert!(!frames.is_idle());
        assert_eq!(frames.run_until_idle(100), 8);
        assert!(frames.is_idle());
    }

    struct Faulty;

    impl Resumable for Faulty {
        fn resume(&mut self) -> Step {
            panic!("cycle blew up");
        }
    }

    #[test]
    fn panicking_cycle_is_dropped_and_others_keep_running() {
        let frames = FrameLoop::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        frames.register(Box::new(Faulty));
        frames.register(Box::new(Countdown {
            left: 2,
            log: log.clone(),
            name: 'a',
        }));

        assert_eq!(frames.tick(), 1);
        assert_eq!(frames.tick(), 1);
        assert_eq!(frames.tick(), 0);
        assert_eq!(*log.borrow(), vec![('a', 2), ('a', 1), ('a', 0)]);
        assert_eq!(frames.ticks(), 3);
    }

}
