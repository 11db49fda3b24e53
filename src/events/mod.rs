//! Runtime events: types, subscriber bus and finished-notification lists.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] synchronous fan-out to [`Subscribe`](crate::Subscribe) implementations
//! - `Listeners` one-shot finished notification lists with explicit unsubscribe
//!
//! ## Quick reference
//! - **Publishers**: `Driver` (host init), task cycles (finish), `TaskHandle`
//!   (start/pause/stop/acquire/release).
//! - **Consumers**: user subscribers registered through
//!   [`DriverBuilder::with_subscribers`](crate::DriverBuilder::with_subscribers).

mod bus;
mod event;
mod listeners;

pub use bus::Bus;
pub(crate) use bus::panic_message;
pub use event::{Event, EventKind};
pub use listeners::ListenerId;
pub(crate) use listeners::Listeners;
