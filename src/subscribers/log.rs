//! # LogWriter - renders events as `tracing` records
//!
//! A minimal subscriber that forwards incoming [`Event`]s to `tracing`.
//! Lifecycle events are logged at `DEBUG`, pool events at `TRACE`,
//! failures at `WARN`.
//!
//! ## Example output (with `tracing-subscriber`'s fmt layer)
//! ```text
//! DEBUG tickvisor: [started] task=task#3
//! DEBUG tickvisor: [stop-requested] task=task#3
//! DEBUG tickvisor: [finished] task=task#3 manual=true
//! TRACE tickvisor: [released] task=task#3
//!  WARN tickvisor: [host-unavailable] reason="no window"
//! ```

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Subscribe for LogWriter {
    fn on_event(&self, e: &Event) {
        let task = e.task.map(|t| t.to_string()).unwrap_or_default();
        match e.kind {
            EventKind::HostInitialized => {
                tracing::debug!(target: "tickvisor", "[host-initialized]");
            }
            EventKind::HostUnavailable => {
                tracing::warn!(target: "tickvisor", reason = ?e.reason, "[host-unavailable]");
            }
            EventKind::SubscriberPanicked => {
                tracing::warn!(target: "tickvisor", reason = ?e.reason, "[subscriber-panicked]");
            }
            EventKind::TaskStarted => {
                tracing::debug!(target: "tickvisor", %task, "[started]");
            }
            EventKind::TaskPaused => {
                tracing::debug!(target: "tickvisor", %task, "[paused]");
            }
            EventKind::TaskResumed => {
                tracing::debug!(target: "tickvisor", %task, "[resumed]");
            }
            EventKind::TaskStopRequested => {
                tracing::debug!(target: "tickvisor", %task, "[stop-requested]");
            }
            EventKind::TaskFinished => {
                tracing::debug!(target: "tickvisor", %task, manual = ?e.manual, "[finished]");
            }
            EventKind::HandleAcquired => {
                tracing::trace!(target: "tickvisor", %task, reused = ?e.reused, "[acquired]");
            }
            EventKind::HandleReleased => {
                tracing::trace!(target: "tickvisor", %task, "[released]");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
