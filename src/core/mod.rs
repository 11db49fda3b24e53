//! Scheduler core: driver, host boundary and the built-in frame loop.
//!
//! The public API from this module is [`Driver`] (shared scheduler state),
//! the [`Host`] seam with its [`Resumable`]/[`Clock`] companions, the
//! reference host [`FrameLoop`], and the tokio pump [`drive`].
//!
//! Internal modules:
//! - [`driver`]: lazy host initialisation, cycle registration, pools, events;
//! - [`builder`]: driver construction;
//! - [`host`]: traits consumed from the host and two clocks;
//! - [`frames`]: cooperative run queue ticked explicitly;
//! - [`runner`]: tokio-driven tick pump.

mod builder;
mod driver;
mod frames;
mod host;
mod runner;

pub use builder::DriverBuilder;
pub use driver::Driver;
pub(crate) use driver::WeakDriver;
pub use frames::FrameLoop;
pub use host::{Clock, Host, ManualClock, MonotonicClock, Resumable};
pub use runner::{drive, DriveExit, DriveReport};
