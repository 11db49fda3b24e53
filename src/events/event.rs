//! # Observability events emitted by the driver, task cycles and handles.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Host events**: lazy host initialisation outcome
//! - **Lifecycle events**: task start, pause, resume, stop request, finish
//! - **Pool events**: handle acquisition and release
//!
//! Events are for observers only. The per-task completion notification that
//! callers subscribe to is [`TaskHandle::on_finished`](crate::TaskHandle::on_finished).
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use tickvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::TaskFinished).with_manual(true);
//!
//! assert_eq!(ev.kind, EventKind::TaskFinished);
//! assert_eq!(ev.manual, Some(true));
//! assert!(ev.task.is_none());
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use crate::tasks::TaskId;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Host events ===
    /// The host was created by the driver's factory.
    HostInitialized,

    /// The host factory failed; the driver is unusable.
    ///
    /// Sets:
    /// - `reason`: factory error
    HostUnavailable,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `reason`: subscriber name and panic message
    SubscriberPanicked,

    // === Task lifecycle events ===
    /// A task cycle was registered with the host.
    ///
    /// Sets:
    /// - `task`: task id
    TaskStarted,

    /// A running task was paused.
    TaskPaused,

    /// A paused task was unpaused.
    TaskResumed,

    /// `stop` was called on a running task; the finish follows on the next tick.
    TaskStopRequested,

    /// The task cycle exited and the finished notification was delivered.
    ///
    /// Sets:
    /// - `task`: task id
    /// - `manual`: `true` if stopped explicitly, `false` if the routine ran out
    TaskFinished,

    // === Pool events ===
    /// A handle was handed out by `create` or `acquire`.
    ///
    /// Sets:
    /// - `task`: id of the task now attached
    /// - `reused`: `true` if the handle came out of the idle set
    HandleAcquired,

    /// A handle was returned to the pool.
    ///
    /// Sets:
    /// - `task`: id of the task it was attached to
    HandleReleased,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Event classification.
    pub kind: EventKind,
    /// Task the event is about, if applicable.
    pub task: Option<TaskId>,
    /// Manual (`true`) or natural (`false`) termination, for `TaskFinished`.
    pub manual: Option<bool>,
    /// Whether an acquired handle was reused from the pool.
    pub reused: Option<bool>,
    /// Human-readable reason (errors, panic details).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with the next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            kind,
            task: None,
            manual: None,
            reused: None,
            reason: None,
        }
    }

    /// Attaches a task id.
    #[inline]
    pub fn with_task(mut self, task: TaskId) -> Self {
        self.task = Some(task);
        self
    }

    /// Attaches the manual/natural termination flag.
    #[inline]
    pub fn with_manual(mut self, manual: bool) -> Self {
        self.manual = Some(manual);
        self
    }

    /// Attaches the pool reuse flag.
    #[inline]
    pub fn with_reused(mut self, reused: bool) -> Self {
        self.reused = Some(reused);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} panic={info}"))
    }

    #[inline]
    pub fn is_subscriber_panic(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberPanicked)
    }
}
