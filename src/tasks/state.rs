//! # TaskState: the per-task state machine.
//!
//! Owns one routine and the `running` / `paused` / `stopped` flags, and
//! advances the routine from a [`Cycle`] the host re-enters once per tick.
//!
//! ## Lifecycle
//! ```text
//!            start()                 cycle observes !running
//!   Fresh ───────────► Scheduled ───────────────────────────► Finished
//!     ▲                  │  ▲                                    │
//!     │                  │  │ pause()/unpause()                  │
//!     │                  └──┘                                    │
//!     └──────────────── rearm(routine) ◄─────────────────────────┘
//! ```
//!
//! ## Re-entry cycle (once per tick)
//! ```text
//! loop {
//!   ├─► !running → phase = Finished, emit Finished(manual = stopped), Complete
//!   ├─► paused   → Yield (routine untouched)
//!   └─► advance routine
//!         ├─ Yield    → Yield
//!         └─ Complete → running = false, loop again (emits on this same pass)
//! }
//! ```
//!
//! ## Rules
//! - The finished notification is only ever emitted from inside the cycle,
//!   so manual and natural termination are delivered from the same context
//! - `stop()` takes effect on the next tick; the routine is not advanced again
//! - No `RefCell` borrow is held while the routine advances or listeners run
//! - A cycle dropped mid-lifetime retires the state silently

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::core::Resumable;
use crate::error::{Control, TaskError};
use crate::events::{Bus, Event, EventKind, ListenerId, Listeners};
use crate::tasks::{Routine, Step};

/// Identity of one task lifetime, unique within a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    /// Wraps a raw id.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw id.
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Never started in this lifetime.
    Fresh,
    /// A cycle is registered with the host and has not exited yet.
    Scheduled,
    /// The cycle exited and the notification was delivered.
    Finished,
}

/// Flags and routine of one in-flight cooperative computation.
pub(crate) struct TaskState {
    id: TaskId,
    routine: Option<Box<dyn Routine>>,
    running: bool,
    paused: bool,
    stopped: bool,
    phase: Phase,
    finished: Listeners<bool>,
}

impl TaskState {
    fn new(id: TaskId, routine: Box<dyn Routine>) -> Self {
        Self {
            id,
            routine: Some(routine),
            running: false,
            paused: false,
            stopped: false,
            phase: Phase::Fresh,
            finished: Listeners::new(),
        }
    }

    fn start(&mut self) -> Result<(), TaskError> {
        match self.phase {
            Phase::Scheduled => return Err(TaskError::AlreadyRunning { task: self.id }),
            Phase::Finished => return Err(TaskError::Finished { task: self.id }),
            Phase::Fresh => {}
        }
        self.running = true;
        self.stopped = false;
        self.phase = Phase::Scheduled;
        Ok(())
    }

    fn stop(&mut self) -> Control {
        if self.phase != Phase::Scheduled || !self.running {
            return Control::Ignored;
        }
        self.stopped = true;
        self.running = false;
        Control::Applied
    }

    fn set_paused(&mut self, paused: bool) -> Control {
        if self.phase != Phase::Scheduled || self.paused == paused {
            return Control::Ignored;
        }
        self.paused = paused;
        Control::Applied
    }
}

impl fmt::Debug for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskState")
            .field("id", &self.id)
            .field("running", &self.running)
            .field("paused", &self.paused)
            .field("stopped", &self.stopped)
            .field("phase", &self.phase)
            .field("listeners", &self.finished.len())
            .finish()
    }
}

/// Shared reference to a [`TaskState`], held by its handle and its cycle.
#[derive(Clone, Debug)]
pub(crate) struct StateRef {
    inner: Rc<RefCell<TaskState>>,
}

impl StateRef {
    pub(crate) fn new(id: TaskId, routine: Box<dyn Routine>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(TaskState::new(id, routine))),
        }
    }

    pub fn id(&self) -> TaskId {
        self.inner.borrow().id
    }

    /// `true` while scheduled for re-entry, including while paused.
    pub fn is_running(&self) -> bool {
        self.inner.borrow().running
    }

    pub fn is_paused(&self) -> bool {
        self.inner.borrow().paused
    }

    /// `true` while a cycle for this state is registered with the host.
    #[cfg(test)]
    pub fn is_scheduled(&self) -> bool {
        self.inner.borrow().phase == Phase::Scheduled
    }

    /// `true` once the cycle exited and the notification was delivered.
    #[cfg(test)]
    pub fn is_finished(&self) -> bool {
        self.inner.borrow().phase == Phase::Finished
    }

    /// Marks the state running and returns the cycle the caller must hand to
    /// the host.
    pub(crate) fn start(&self, bus: &Bus) -> Result<Cycle, TaskError> {
        self.inner.borrow_mut().start()?;
        Ok(Cycle {
            state: self.clone(),
            bus: bus.clone(),
        })
    }

    pub(crate) fn stop(&self) -> Control {
        self.inner.borrow_mut().stop()
    }

    pub(crate) fn pause(&self) -> Control {
        self.inner.borrow_mut().set_paused(true)
    }

    pub(crate) fn unpause(&self) -> Control {
        self.inner.borrow_mut().set_paused(false)
    }

    pub(crate) fn subscribe(&self, f: impl FnMut(bool) + 'static) -> ListenerId {
        let listeners = self.inner.borrow().finished.clone();
        listeners.subscribe(f)
    }

    pub(crate) fn unsubscribe(&self, id: ListenerId) -> bool {
        let listeners = self.inner.borrow().finished.clone();
        listeners.unsubscribe(id)
    }

    #[cfg(test)]
    pub(crate) fn listener_count(&self) -> usize {
        self.inner.borrow().finished.len()
    }

    /// Swaps in a new routine for a new lifetime. Only valid once the previous
    /// cycle has exited (or was never registered).
    pub(crate) fn rearm(
        &self,
        id: TaskId,
        routine: Box<dyn Routine>,
    ) -> Result<(), Box<dyn Routine>> {
        let mut st = self.inner.borrow_mut();
        if st.phase == Phase::Scheduled {
            return Err(routine);
        }
        st.id = id;
        st.routine = Some(routine);
        st.running = false;
        st.paused = false;
        st.stopped = false;
        st.phase = Phase::Fresh;
        Ok(())
    }

    #[cfg(test)]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }
}

/// The host-side re-entry cycle of one task lifetime.
pub(crate) struct Cycle {
    state: StateRef,
    bus: Bus,
}

impl Cycle {
    fn finish(&mut self) -> Step {
        let (id, manual, listeners) = {
            let mut st = self.state.inner.borrow_mut();
            st.phase = Phase::Finished;
            (st.id, st.stopped, st.finished.clone())
        };
        tracing::debug!(task = %id, manual, "task finished");
        self.bus
            .publish(Event::new(EventKind::TaskFinished).with_task(id).with_manual(manual));
        listeners.emit(manual);
        Step::Complete
    }
}

impl Resumable for Cycle {
    fn resume(&mut self) -> Step {
        loop {
            let routine = {
                let mut st = self.state.inner.borrow_mut();
                if !st.running {
                    drop(st);
                    return self.finish();
                }
                if st.paused {
                    return Step::Yield;
                }
                st.routine.take()
            };

            // The routine may call back into its own handle while it runs.
            let step = match routine {
                Some(mut routine) => {
                    let step = routine.advance();
                    self.state.inner.borrow_mut().routine = Some(routine);
                    step
                }
                None => Step::Complete,
            };

            match step {
                Step::Yield => return Step::Yield,
                Step::Complete => self.state.inner.borrow_mut().running = false,
            }
        }
    }
}

impl Drop for Cycle {
    // A cycle dropped before it finished (its routine panicked, or the host
    // went away) retires the lifetime without a notification.
    fn drop(&mut self) {
        let Ok(mut st) = self.state.inner.try_borrow_mut() else {
            return;
        };
        if st.phase == Phase::Scheduled {
            st.running = false;
            st.phase = Phase::Finished;
            tracing::warn!(task = %st.id, "cycle dropped before finishing");
        }
    }
}

impl fmt::Debug for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cycle").field("state", &self.state).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::tasks::{yields, RoutineFn};

    fn state(routine: impl Routine) -> StateRef {
        StateRef::new(TaskId::from_raw(1), Box::new(routine))
    }

    fn record(state: &StateRef) -> Rc<RefCell<Vec<bool>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        state.subscribe(move |manual| s.borrow_mut().push(manual));
        seen
    }

    #[test]
    fn natural_exhaustion_reports_false_once() {
        let st = state(yields(2));
        let seen = record(&st);
        let mut cycle = st.start(&Bus::default()).unwrap();

        assert_eq!(cycle.resume(), Step::Yield);
        assert_eq!(cycle.resume(), Step::Yield);
        assert!(seen.borrow().is_empty());
        assert_eq!(cycle.resume(), Step::Complete);
        assert_eq!(*seen.borrow(), vec![false]);
        assert!(!st.is_running());
        assert!(st.is_finished());
    }

    #[test]
    fn stop_reports_true_on_next_resume() {
        let st = state(yields(100));
        let seen = record(&st);
        let mut cycle = st.start(&Bus::default()).unwrap();

        assert_eq!(st.stop(), Control::Applied);
        assert_eq!(st.stop(), Control::Ignored);
        assert!(!st.is_running());
        assert!(st.is_scheduled());
        assert!(seen.borrow().is_empty());

        assert_eq!(cycle.resume(), Step::Complete);
        assert_eq!(*seen.borrow(), vec![true]);
    }

    #[test]
    fn paused_does_not_advance() {
        let advances = Rc::new(Cell::new(0));
        let a = advances.clone();
        let st = state(RoutineFn::new(move || {
            a.set(a.get() + 1);
            Step::Yield
        }));
        let mut cycle = st.start(&Bus::default()).unwrap();

        cycle.resume();
        assert_eq!(st.pause(), Control::Applied);
        assert!(st.is_running());
        for _ in 0..5 {
            assert_eq!(cycle.resume(), Step::Yield);
        }
        assert_eq!(advances.get(), 1);
        assert_eq!(st.unpause(), Control::Applied);
        cycle.resume();
        assert_eq!(advances.get(), 2);
    }

    #[test]
    fn start_errors() {
        let st = state(yields(0));
        let mut cycle = st.start(&Bus::default()).unwrap();
        assert_eq!(
            st.start(&Bus::default()).unwrap_err(),
            TaskError::AlreadyRunning { task: st.id() }
        );

        // stopped but not yet retired is still scheduled
        st.stop();
        assert!(matches!(
            st.start(&Bus::default()),
            Err(TaskError::AlreadyRunning { .. })
        ));

        cycle.resume();
        assert_eq!(
            st.start(&Bus::default()).unwrap_err(),
            TaskError::Finished { task: st.id() }
        );
    }

    #[test]
    fn lifecycle_calls_before_start_are_ignored() {
        let st = state(yields(1));
        assert_eq!(st.stop(), Control::Ignored);
        assert_eq!(st.pause(), Control::Ignored);
        assert_eq!(st.unpause(), Control::Ignored);
        assert!(!st.is_paused());
    }

    #[test]
    fn rearm_only_after_retirement() {
        let st = state(yields(0));
        let mut cycle = st.start(&Bus::default()).unwrap();
        assert!(st.rearm(TaskId::from_raw(2), Box::new(yields(0))).is_err());

        cycle.resume();
        assert!(st.rearm(TaskId::from_raw(2), Box::new(yields(1))).is_ok());
        assert_eq!(st.id(), TaskId::from_raw(2));
        assert!(!st.is_finished());
        assert!(st.start(&Bus::default()).is_ok());
    }

    #[test]
    fn dropped_cycle_retires_state_silently() {
        let st = state(yields(5));
        let seen = record(&st);
        let mut cycle = st.start(&Bus::default()).unwrap();
        cycle.resume();
        drop(cycle);

        assert!(!st.is_running());
        assert!(st.is_finished());
        assert!(seen.borrow().is_empty());
        assert!(st.rearm(TaskId::from_raw(2), Box::new(yields(0))).is_ok());
    }

    #[test]
    fn routine_can_stop_itself() {
        let slot: Rc<RefCell<Option<StateRef>>> = Rc::new(RefCell::new(None));
        let s = slot.clone();
        let st = state(RoutineFn::new(move || {
            if let Some(me) = s.borrow().as_ref() {
                me.stop();
            }
            Step::Yield
        }));
        *slot.borrow_mut() = Some(st.clone());
        let seen = record(&st);
        let mut cycle = st.start(&Bus::default()).unwrap();

        assert_eq!(cycle.resume(), Step::Yield);
        assert_eq!(cycle.resume(), Step::Complete);
        assert_eq!(*seen.borrow(), vec![true]);
        slot.borrow_mut().take();
    }
}
