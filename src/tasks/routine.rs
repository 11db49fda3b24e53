//! # Resumable units of work.
//!
//! A [`Routine`] is the body of a task: an opaque computation advanced one
//! step per tick. Each call to [`Routine::advance`] runs until the routine's
//! next suspension point and reports whether more work remains.
//!
//! Provided implementations:
//! - [`RoutineFn`] - a closure returning [`Step`]
//! - [`IterRoutine`] - an iterator, one item per tick
//! - [`FutureRoutine`](crate::FutureRoutine) - an `async` body
//! - [`Timed`](crate::Timed) - a progress callback over clock time
//!
//! ## Example
//! ```rust
//! use tickvisor::{Routine, RoutineFn, Step};
//!
//! let mut left = 2;
//! let mut r = RoutineFn::new(move || {
//!     if left == 0 {
//!         return Step::Complete;
//!     }
//!     left -= 1;
//!     Step::Yield
//! });
//!
//! assert_eq!(r.advance(), Step::Yield);
//! assert_eq!(r.advance(), Step::Yield);
//! assert_eq!(r.advance(), Step::Complete);
//! ```

use std::fmt;

/// Result of advancing a routine (or resuming a host cycle) once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Suspended; resume on the next tick.
    Yield,
    /// No work left.
    Complete,
}

impl Step {
    /// Returns `true` for [`Step::Yield`].
    #[inline]
    pub fn more_work(self) -> bool {
        matches!(self, Step::Yield)
    }

    /// Converts a "has more work" flag.
    #[inline]
    pub fn from_more_work(more: bool) -> Self {
        if more {
            Step::Yield
        } else {
            Step::Complete
        }
    }
}

/// Cooperative, steppable unit of work.
///
/// Implementations must not block: one call is one slice of a tick.
/// Calling `advance` after it returned [`Step::Complete`] is allowed and
/// must keep returning `Complete`.
pub trait Routine: 'static {
    /// Runs the routine until its next suspension point.
    fn advance(&mut self) -> Step;
}

impl Routine for Box<dyn Routine> {
    fn advance(&mut self) -> Step {
        (**self).advance()
    }
}

/// Closure-backed routine.
///
/// The closure is called once per tick and decides when it is done. Once it
/// returned [`Step::Complete`] it is not called again.
pub struct RoutineFn<F> {
    f: F,
    done: bool,
}

impl<F> RoutineFn<F>
where
    F: FnMut() -> Step + 'static,
{
    pub fn new(f: F) -> Self {
        Self { f, done: false }
    }
}

impl<F> fmt::Debug for RoutineFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutineFn").field("done", &self.done).finish()
    }
}

impl<F> Routine for RoutineFn<F>
where
    F: FnMut() -> Step + 'static,
{
    fn advance(&mut self) -> Step {
        if self.done {
            return Step::Complete;
        }
        let step = (self.f)();
        self.done = step == Step::Complete;
        step
    }
}

/// Iterator-backed routine: each `next()` is one step.
///
/// This mirrors generator-style coroutine bodies: the item value is ignored,
/// only its presence counts. An iterator of `n` items yields `n` times and
/// completes on the following tick.
#[derive(Debug)]
pub struct IterRoutine<I> {
    iter: Option<I>,
}

impl<I> IterRoutine<I>
where
    I: Iterator + 'static,
{
    pub fn new(iter: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            iter: Some(iter.into_iter()),
        }
    }
}

impl<I> Routine for IterRoutine<I>
where
    I: Iterator + 'static,
{
    fn advance(&mut self) -> Step {
        let Some(iter) = self.iter.as_mut() else {
            return Step::Complete;
        };
        if iter.next().is_some() {
            Step::Yield
        } else {
            self.iter = None;
            Step::Complete
        }
    }
}

/// Routine that yields `n` times and then completes.
pub fn yields(n: usize) -> IterRoutine<std::ops::Range<usize>> {
    IterRoutine::new(0..n)
}
