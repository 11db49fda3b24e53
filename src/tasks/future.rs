//! # `async` task bodies.
//!
//! [`FutureRoutine`] turns a future into a [`Routine`]: every tick the future
//! is polled once with a no-op waker. Suspension points inside the body are
//! [`next_tick`] / [`ticks`] awaits; any other pending future is simply
//! polled again on the next tick.
//!
//! ## Example
//! ```rust
//! use tickvisor::{next_tick, FutureRoutine, Routine, Step};
//!
//! let mut r = FutureRoutine::new(async {
//!     next_tick().await;
//!     next_tick().await;
//! });
//!
//! assert_eq!(r.advance(), Step::Yield);
//! assert_eq!(r.advance(), Step::Yield);
//! assert_eq!(r.advance(), Step::Complete);
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::task::noop_waker_ref;

use crate::tasks::{Routine, Step};

/// Routine polling an `async` body once per tick.
pub struct FutureRoutine {
    fut: Option<Pin<Box<dyn Future<Output = ()>>>>,
}

impl FutureRoutine {
    pub fn new(fut: impl Future<Output = ()> + 'static) -> Self {
        Self {
            fut: Some(Box::pin(fut)),
        }
    }
}

impl fmt::Debug for FutureRoutine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FutureRoutine")
            .field("done", &self.fut.is_none())
            .finish()
    }
}

impl Routine for FutureRoutine {
    fn advance(&mut self) -> Step {
        let Some(fut) = self.fut.as_mut() else {
            return Step::Complete;
        };
        let mut cx = Context::from_waker(noop_waker_ref());
        match fut.as_mut().poll(&mut cx) {
            Poll::Ready(()) => {
                self.fut = None;
                Step::Complete
            }
            Poll::Pending => Step::Yield,
        }
    }
}

/// A future that suspends the task body for one or more ticks.
#[derive(Debug)]
#[must_use = "futures do nothing unless `.await`ed or polled"]
pub struct NextTick {
    ticks: usize,
}

impl NextTick {
    /// Returns a future that stays pending for `ticks` polls.
    #[inline]
    pub const fn new(ticks: usize) -> Self {
        Self { ticks }
    }
}

impl Future for NextTick {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.ticks == 0 {
            return Poll::Ready(());
        }
        self.ticks -= 1;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

/// Suspend until the next tick.
#[inline]
pub fn next_tick() -> NextTick {
    NextTick::new(1)
}

/// Suspend for `n` ticks.
#[inline]
pub fn ticks(n: usize) -> NextTick {
    NextTick::new(n)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn ready_future_completes_on_first_advance() {
        let ran = Rc::new(Cell::new(false));
        let r2 = ran.clone();
        let mut r = FutureRoutine::new(async move { r2.set(true) });
        assert_eq!(r.advance(), Step::Complete);
        assert!(ran.get());
        assert_eq!(r.advance(), Step::Complete);
    }

    #[test]
    fn ticks_suspends_n_times() {
        let progress = Rc::new(Cell::new(0));
        let p = progress.clone();
        let mut r = FutureRoutine::new(async move {
            p.set(1);
            ticks(3).await;
            p.set(2);
        });

        assert_eq!(r.advance(), Step::Yield);
        assert_eq!(progress.get(), 1);
        assert_eq!(r.advance(), Step::Yield);
        assert_eq!(r.advance(), Step::Yield);
        assert_eq!(progress.get(), 1);
        assert_eq!(r.advance(), Step::Complete);
        assert_eq!(progress.get(), 2);
    }

    #[test]
    fn zero_ticks_is_immediate() {
        let mut r = FutureRoutine::new(async {
            ticks(0).await;
        });
        assert_eq!(r.advance(), Step::Complete);
    }
}
