//! # Tasks: routines, their state and the caller-facing handle.
//!
//! - [`Routine`] - the body of a task, advanced one step per tick
//! - [`RoutineFn`], [`IterRoutine`], [`FutureRoutine`], [`Timed`] - ready-made routines
//! - `StateRef` - shared flags of one task, re-entered by its `Cycle`
//! - [`TaskHandle`] - pooled proxy callers start, stop, pause and subscribe through

mod future;
mod handle;
mod routine;
mod state;
mod timed;

pub use future::{next_tick, ticks, FutureRoutine, NextTick};
pub use handle::TaskHandle;
pub use routine::{yields, IterRoutine, Routine, RoutineFn, Step};
pub(crate) use state::StateRef;
pub use state::TaskId;
pub use timed::Timed;
