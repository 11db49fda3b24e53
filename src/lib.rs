//! # tickvisor
//!
//! **Tickvisor** is a single-threaded cooperative task scheduler driven by a
//! per-tick host loop.
//!
//! Tasks are resumable routines advanced exactly one step per tick. Callers
//! start, stop, pause and unpause them through pooled [`TaskHandle`]s and
//! learn about termination through a finished notification that says whether
//! the task was stopped or ran out of work. The crate is meant to be embedded
//! in frame-driven programs: game loops, UI animation, simulations.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  TaskHandle  │   │  TaskHandle  │   │  TaskHandle  │
//!     │ (routine #1) │   │ (routine #2) │   │ (routine #3) │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Driver (shared scheduler state)                                  │
//! │  - lazy Host (created once, on first task creation)               │
//! │  - Pools (idle TaskHandles keyed by type)                         │
//! │  - Bus (synchronous fan-out to subscribers)                       │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        ▼ register         ▼ register         ▼ register      │
//! ┌───────────────────────────────────────────────────────┐    │ publish
//! │  Host (FrameLoop or your own)                         │    │
//! │  tick: resume every registered Cycle once             │    │
//! └──────┬──────────────────┬──────────────────┬──────────┘    │
//!        ▼                  ▼                  ▼               ▼
//!     ┌──────────┐       ┌──────────┐       ┌──────────┐   ┌───────────┐
//!     │  Cycle   │       │  Cycle   │       │  Cycle   │   │Subscribers│
//!     │ (state)  │       │ (state)  │       │ (state)  │   │ LogWriter │
//!     └──────────┘       └──────────┘       └──────────┘   └───────────┘
//! ```
//!
//! ### Lifecycle
//! ```text
//! TaskHandle::acquire ──► Driver::begin_cycle ──► Host::register(Cycle)
//!
//! every tick {
//!   ├─► stopped / exhausted ─► emit Finished(manual), leave the host
//!   ├─► paused              ─► yield, routine untouched
//!   └─► advance routine one step
//! }
//!
//! Finished ──► handle subscribers ──► (self_recycle) handle back to the pool
//! ```
//!
//! ## Features
//! | Area              | Description                                                     | Key types / traits                          |
//! |-------------------|-----------------------------------------------------------------|---------------------------------------------|
//! | **Tasks**         | Start, stop, pause and observe cooperative routines.            | [`TaskHandle`], [`Routine`], [`Step`]       |
//! | **Routines**      | Closures, iterators, `async` bodies, clock-driven progress.     | [`RoutineFn`], [`IterRoutine`], [`FutureRoutine`], [`Timed`] |
//! | **Host**          | Per-tick primitive and clock; a reference frame loop.           | [`Host`], [`Clock`], [`FrameLoop`], [`drive`] |
//! | **Pooling**       | Reuse of released handles with double-release detection.        | [`Pool`], [`Pools`], [`Recycle`]            |
//! | **Subscriber API**| Hook into driver and task lifecycle events.                     | [`Subscribe`], [`Event`]                    |
//! | **Errors**        | Typed errors and benign no-op reporting.                        | [`TaskError`], [`DriverError`], [`Control`] |
//! | **Configuration** | Centralize driver settings.                                     | [`Config`]                                  |
//!
//! ## Optional features
//! - `logging` (default): exports the built-in [`LogWriter`] subscriber.
//!
//! ## Example
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use tickvisor::{yields, Config, Driver, FrameLoop, TaskHandle};
//!
//! let frames = FrameLoop::new();
//! let driver = Driver::builder(Config::default())
//!     .with_host(frames.clone())
//!     .build();
//!
//! let task = TaskHandle::acquire(&driver, yields(3), true)?;
//! let stopped = Rc::new(Cell::new(None));
//! let s = stopped.clone();
//! task.on_finished(move |manual| s.set(Some(manual)))?;
//!
//! frames.run_until_idle(100);
//! assert_eq!(stopped.get(), Some(false));
//! assert!(task.is_released());
//! # Ok::<(), tickvisor::TaskError>(())
//! ```

mod config;
mod core;
mod error;
mod events;
mod pool;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use crate::config::Config;
pub use crate::core::{
    drive, Clock, DriveExit, DriveReport, Driver, DriverBuilder, FrameLoop, Host, ManualClock,
    MonotonicClock, Resumable,
};
pub use crate::error::{Control, DriverError, PoolError, TaskError};
pub use crate::events::{Bus, Event, EventKind, ListenerId};
pub use crate::pool::{Pool, PoolStats, Pools, Recycle};
pub use crate::subscribers::Subscribe;
pub use crate::tasks::{
    next_tick, ticks, yields, FutureRoutine, IterRoutine, NextTick, Routine, RoutineFn, Step,
    TaskHandle, TaskId, Timed,
};

// Built-in tracing subscriber.
// Disable with: `--no-default-features`
#[cfg(feature = "logging")]
pub use crate::subscribers::LogWriter;
