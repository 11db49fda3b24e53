//! # Synchronous event fan-out to subscribers.
//!
//! [`Bus`] delivers each published [`Event`] to every registered
//! [`Subscribe`] implementation, in registration order, on the driving thread.
//!
//! ## Rules
//! - **Per-subscriber order**: each subscriber sees events in publish order
//! - **Isolation**: a panicking subscriber is caught with `catch_unwind`; the
//!   others still receive the event and a `SubscriberPanicked` event follows
//! - A panic while handling `SubscriberPanicked` is logged, not re-published
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave shared state
//! inconsistent if a subscriber panics while holding a `RefCell` borrow.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use crate::events::Event;
use crate::subscribers::Subscribe;

/// Cloneable handle to the driver's subscriber list.
#[derive(Clone)]
pub struct Bus {
    subscribers: Rc<[Rc<dyn Subscribe>]>,
}

impl Default for Bus {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Bus {
    /// Creates a bus delivering to `subscribers`.
    pub fn new(subscribers: Vec<Rc<dyn Subscribe>>) -> Self {
        Self {
            subscribers: subscribers.into(),
        }
    }

    /// Number of registered subscribers.
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// Returns `true` if nobody listens.
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Publishes an event to all subscribers.
    pub fn publish(&self, event: Event) {
        tracing::trace!(seq = event.seq, kind = ?event.kind, task = ?event.task, "event");
        if self.subscribers.is_empty() {
            return;
        }

        let mut panics = Vec::new();
        for sub in self.subscribers.iter() {
            let res = panic::catch_unwind(AssertUnwindSafe(|| sub.on_event(&event)));
            if let Err(panic_err) = res {
                panics.push((sub.name(), panic_message(panic_err.as_ref())));
            }
        }

        for (name, info) in panics {
            if event.is_subscriber_panic() {
                tracing::warn!(subscriber = name, %info, "subscriber panicked on panic report");
                continue;
            }
            tracing::warn!(subscriber = name, %info, "subscriber panicked");
            self.publish(Event::subscriber_panicked(name, info));
        }
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::events::EventKind;

    #[derive(Default)]
    struct Recorder {
        seen: RefCell<Vec<EventKind>>,
    }

    impl Subscribe for Recorder {
        fn on_event(&self, event: &Event) {
            self.seen.borrow_mut().push(event.kind);
        }

        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    struct Exploding;

    impl Subscribe for Exploding {
        fn on_event(&self, event: &Event) {
            if event.kind == EventKind::TaskStarted {
                panic!("boom");
            }
        }

        fn name(&self) -> &'static str {
            "exploding"
        }
    }

    #[test]
    fn delivers_in_order() {
        let rec = Rc::new(Recorder::default());
        let bus = Bus::new(vec![rec.clone() as Rc<dyn Subscribe>]);
        bus.publish(Event::new(EventKind::TaskStarted));
        bus.publish(Event::new(EventKind::TaskFinished));
        assert_eq!(
            *rec.seen.borrow(),
            vec![EventKind::TaskStarted, EventKind::TaskFinished]
        );
    }

    #[test]
    fn panicking_subscriber_is_isolated() {
        let rec = Rc::new(Recorder::default());
        let bus = Bus::new(vec![
            Rc::new(Exploding) as Rc<dyn Subscribe>,
            rec.clone() as Rc<dyn Subscribe>,
        ]);
        bus.publish(Event::new(EventKind::TaskStarted));
        assert_eq!(
            *rec.seen.borrow(),
            vec![EventKind::TaskStarted, EventKind::SubscriberPanicked]
        );
    }

    #[test]
    fn empty_bus_is_noop() {
        let bus = Bus::default();
        assert!(bus.is_empty());
        bus.publish(Event::new(EventKind::TaskStarted));
    }
}
