//! # Core subscriber trait
//!
//! `Subscribe` is the extension point for plugging custom event handlers into
//! a [`Driver`](crate::Driver). Subscribers are called synchronously on the
//! driving thread, from inside the tick or lifecycle call that produced the
//! event.
//!
//! ## Contract
//! - Keep `on_event` short: it runs inside the scheduler tick.
//! - Do not call back into the handle the event is about; observe, record, return.
//! - A panic is caught and reported as `SubscriberPanicked`.
//!
//! ## Example
//! ```rust
//! use std::cell::Cell;
//! use tickvisor::{Event, EventKind, Subscribe};
//!
//! #[derive(Default)]
//! struct FinishCounter(Cell<usize>);
//!
//! impl Subscribe for FinishCounter {
//!     fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::TaskFinished {
//!             self.0.set(self.0.get() + 1);
//!         }
//!     }
//!     fn name(&self) -> &'static str { "finish-counter" }
//! }
//! ```

use crate::events::Event;

/// Contract for event subscribers.
pub trait Subscribe: 'static {
    /// Handle a single event for this subscriber.
    fn on_event(&self, event: &Event);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
