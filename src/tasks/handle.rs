//! # TaskHandle: the caller-facing task object.
//!
//! A [`TaskHandle`] represents one schedulable unit of work. It delegates
//! lifecycle calls to its `StateRef`, relays the state's finished
//! notification to its own subscribers and, when self-recycling, returns
//! itself to the driver's pool right after that notification.
//!
//! ## Slot states
//! ```text
//!   create / acquire            release / self-recycle
//!  ───────────────► Active(state) ─────────────────────► Idle(state)
//!                        ▲                                   │
//!                        └────────── acquire (reuse) ────────┘
//! ```
//! The `Idle` tag is the pool's bookkeeping bit: every operation on an idle
//! handle fails with [`TaskError::Released`], and releasing it again fails
//! with a double-release error.
//!
//! ## Finished relay
//! ```text
//! Cycle ──► state listeners ──► relay
//!                                ├─► handle subscribers (manual)
//!                                └─► if self_recycle:
//!                                      stop state, drop relay, clear subscribers,
//!                                      return handle to the pool
//! ```
//!
//! ## Example
//! ```rust
//! use tickvisor::{yields, Config, Driver, FrameLoop, TaskHandle};
//!
//! let frames = FrameLoop::new();
//! let driver = Driver::new(Config::default(), frames.clone());
//!
//! let a = TaskHandle::acquire(&driver, yields(3), true)?;
//! frames.run_until_idle(10);
//! assert!(a.is_released());
//!
//! // the same object comes back, carrying a new routine
//! let b = TaskHandle::acquire(&driver, yields(1), false)?;
//! assert!(TaskHandle::ptr_eq(&a, &b));
//! assert!(!b.is_running());
//! # Ok::<(), tickvisor::TaskError>(())
//! ```

use std::cell::RefCell;
use std::fmt;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::time::Duration;

use crate::core::{Driver, WeakDriver};
use crate::error::{Control, PoolError, TaskError};
use crate::events::{Event, EventKind, ListenerId, Listeners};
use crate::pool::Recycle;
use crate::tasks::{Routine, StateRef, TaskId, Timed};

/// Two-state tagged wrapper around the owned task state.
enum Slot {
    /// Handed out to a caller. `None` only before the first attach.
    Active(Option<StateRef>),
    /// Sitting in (or evicted from) the pool; keeps the state for reuse.
    Idle(Option<StateRef>),
}

struct HandleCore {
    slot: Slot,
    driver: WeakDriver,
    relay: Option<ListenerId>,
    self_recycle: bool,
    finished: Listeners<bool>,
}

/// Caller-facing proxy for one task. Clones refer to the same handle.
#[derive(Clone)]
pub struct TaskHandle {
    core: Rc<RefCell<HandleCore>>,
}

impl Default for TaskHandle {
    fn default() -> Self {
        Self {
            core: Rc::new(RefCell::new(HandleCore {
                slot: Slot::Active(None),
                driver: WeakDriver::default(),
                relay: None,
                self_recycle: true,
                finished: Listeners::new(),
            })),
        }
    }
}

impl Recycle for TaskHandle {
    fn is_idle(&self) -> bool {
        matches!(self.core.borrow().slot, Slot::Idle(_))
    }

    fn set_idle(&mut self, idle: bool) {
        let mut core = self.core.borrow_mut();
        let state = match mem::replace(&mut core.slot, Slot::Active(None)) {
            Slot::Active(state) | Slot::Idle(state) => state,
        };
        core.slot = if idle {
            Slot::Idle(state)
        } else {
            Slot::Active(state)
        };
    }
}

impl TaskHandle {
    /// Creates a fresh handle and task state for `routine`.
    ///
    /// Starts it immediately when `auto_start` is set. Fails with a fatal
    /// [`TaskError::Driver`] if the driver's host cannot be brought up.
    pub fn create(
        driver: &Driver,
        routine: impl Routine,
        auto_start: bool,
    ) -> Result<Self, TaskError> {
        let handle = TaskHandle::default();
        handle.attach(driver, Box::new(routine), false)?;
        if auto_start {
            handle.start()?;
        }
        Ok(handle)
    }

    /// Like [`create`](Self::create), but reuses an idle handle from the
    /// driver's pool when one is available.
    ///
    /// A reused handle keeps its task state and only swaps the routine in,
    /// unless that state's previous cycle has not retired yet.
    pub fn acquire(
        driver: &Driver,
        routine: impl Routine,
        auto_start: bool,
    ) -> Result<Self, TaskError> {
        // surface host failure before a pooled handle is taken out
        driver.host()?;

        let reused = driver.idle_len::<TaskHandle>() > 0;
        let handle = driver.pool_get::<TaskHandle>();
        handle.attach(driver, Box::new(routine), reused)?;
        if auto_start {
            handle.start()?;
        }
        Ok(handle)
    }

    /// Acquires a task calling `f(progress)` once per tick, with linear
    /// progress in `[0, 1)`, until `total` elapsed on the host clock.
    pub fn acquire_timed<F>(
        driver: &Driver,
        total: Duration,
        f: F,
        auto_start: bool,
    ) -> Result<Self, TaskError>
    where
        F: FnMut(f32) + 'static,
    {
        let clock = driver.clock()?;
        Self::acquire(driver, Timed::new(clock, total, f), auto_start)
    }

    fn attach(
        &self,
        driver: &Driver,
        routine: Box<dyn Routine>,
        reused: bool,
    ) -> Result<(), TaskError> {
        let retained = match &self.core.borrow().slot {
            Slot::Active(state) => state.clone(),
            Slot::Idle(_) => return Err(TaskError::Released),
        };

        let id = driver.next_id();
        let state = match retained {
            Some(state) => match state.rearm(id, routine) {
                Ok(()) => state,
                Err(routine) => {
                    tracing::trace!(task = %id, "retained state still retiring; allocating");
                    driver.create_state(id, routine)?
                }
            },
            None => driver.create_state(id, routine)?,
        };

        // Keeps the handle alive while the lifetime runs, even if the caller
        // dropped it. Released together with the relay subscription.
        let me = self.clone();
        let relay = state.subscribe(move |manual| me.relay_finished(id, manual));

        let finished = {
            let mut core = self.core.borrow_mut();
            core.slot = Slot::Active(Some(state));
            core.driver = driver.downgrade();
            core.relay = Some(relay);
            core.self_recycle = driver.config().self_recycle;
            core.finished.clone()
        };
        finished.clear();

        driver.publish(
            Event::new(EventKind::HandleAcquired)
                .with_task(id)
                .with_reused(reused),
        );
        Ok(())
    }

    fn attached(&self) -> Result<(StateRef, Driver), TaskError> {
        let core = self.core.borrow();
        let state = match &core.slot {
            Slot::Idle(_) => return Err(TaskError::Released),
            Slot::Active(None) => return Err(TaskError::Detached),
            Slot::Active(Some(state)) => state.clone(),
        };
        let driver = core.driver.upgrade()?;
        Ok((state, driver))
    }

    fn active_state(&self) -> Option<StateRef> {
        match &self.core.borrow().slot {
            Slot::Active(state) => state.clone(),
            Slot::Idle(_) => None,
        }
    }

    /// Begins execution; the first step runs on the next tick.
    ///
    /// Starting a running task, or one whose routine already finished, is an
    /// error.
    pub fn start(&self) -> Result<(), TaskError> {
        let (state, driver) = self.attached()?;
        driver.begin_cycle(&state)
    }

    /// Stops the task at its next tick; the routine is not advanced again.
    ///
    /// The finished notification (`manual = true`) is delivered from that tick,
    /// never from inside this call.
    pub fn stop(&self) -> Result<Control, TaskError> {
        let (state, driver) = self.attached()?;
        let control = state.stop();
        if control.is_applied() {
            tracing::debug!(task = %state.id(), "stop requested");
            driver.publish(Event::new(EventKind::TaskStopRequested).with_task(state.id()));
        }
        Ok(control)
    }

    /// Suspends the task without stopping it. Paused tasks still count as running.
    pub fn pause(&self) -> Result<Control, TaskError> {
        let (state, driver) = self.attached()?;
        let control = state.pause();
        if control.is_applied() {
            driver.publish(Event::new(EventKind::TaskPaused).with_task(state.id()));
        }
        Ok(control)
    }

    /// Lets a paused task advance again from the next tick.
    pub fn unpause(&self) -> Result<Control, TaskError> {
        let (state, driver) = self.attached()?;
        let control = state.unpause();
        if control.is_applied() {
            driver.publish(Event::new(EventKind::TaskResumed).with_task(state.id()));
        }
        Ok(control)
    }

    /// `true` while the task is scheduled for further steps, paused or not.
    ///
    /// Always `false` for a released handle.
    pub fn is_running(&self) -> bool {
        self.active_state().is_some_and(|s| s.is_running())
    }

    /// `true` while the task is paused.
    pub fn is_paused(&self) -> bool {
        self.active_state().is_some_and(|s| s.is_paused())
    }

    /// Id of the current task lifetime, `None` once released.
    pub fn id(&self) -> Option<TaskId> {
        self.active_state().map(|s| s.id())
    }

    /// `true` once the handle went back to the pool.
    pub fn is_released(&self) -> bool {
        self.is_idle()
    }

    /// Whether the handle returns itself to the pool after finishing.
    pub fn self_recycle(&self) -> bool {
        self.core.borrow().self_recycle
    }

    /// Enables or disables self-recycling for the current lifetime.
    ///
    /// With self-recycling disabled the owner calls [`release`](Self::release).
    pub fn set_self_recycle(&self, enabled: bool) {
        self.core.borrow_mut().self_recycle = enabled;
    }

    /// Subscribes to the finished notification of the current lifetime.
    ///
    /// `f` receives `true` if the task was stopped, `false` if its routine
    /// ran out. Subscribers are dropped when the handle is released.
    pub fn on_finished(&self, f: impl FnMut(bool) + 'static) -> Result<ListenerId, TaskError> {
        let finished = {
            let core = self.core.borrow();
            if matches!(core.slot, Slot::Idle(_)) {
                return Err(TaskError::Released);
            }
            core.finished.clone()
        };
        Ok(finished.subscribe(f))
    }

    /// Removes a finished subscriber. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let finished = self.core.borrow().finished.clone();
        finished.unsubscribe(id)
    }

    /// Number of finished subscribers of the current lifetime.
    pub fn subscriber_count(&self) -> usize {
        self.core.borrow().finished.len()
    }

    /// Returns the handle to its driver's pool.
    ///
    /// Stops the task if it is still running, drops every subscriber, and
    /// makes the handle available to the next [`acquire`](Self::acquire).
    /// Releasing an already released handle is an error.
    pub fn release(&self) -> Result<(), TaskError> {
        let driver = {
            let core = self.core.borrow();
            if matches!(core.slot, Slot::Idle(_)) {
                return Err(double_release());
            }
            core.driver.upgrade()?
        };
        self.release_to(&driver)
    }

    fn release_to(&self, driver: &Driver) -> Result<(), TaskError> {
        let (state, relay, finished) = {
            let mut core = self.core.borrow_mut();
            let state = match &core.slot {
                Slot::Active(state) => state.clone(),
                Slot::Idle(_) => return Err(double_release()),
            };
            (state, core.relay.take(), core.finished.clone())
        };

        if let Some(state) = &state {
            if state.stop().is_applied() {
                driver.publish(Event::new(EventKind::TaskStopRequested).with_task(state.id()));
            }
            if let Some(relay) = relay {
                state.unsubscribe(relay);
            }
        }
        finished.clear();

        driver.pool_release(self.clone())?;

        let id = state.as_ref().map(StateRef::id);
        tracing::trace!(task = ?id, "handle released");
        let mut ev = Event::new(EventKind::HandleReleased);
        if let Some(id) = id {
            ev = ev.with_task(id);
        }
        driver.publish(ev);
        Ok(())
    }

    /// Called by the state's finished listener of lifetime `id`.
    ///
    /// A panicking subscriber does not keep the handle out of the pool: the
    /// handle is recycled first, then the panic continues to the host.
    fn relay_finished(&self, id: TaskId, manual: bool) {
        let finished = self.core.borrow().finished.clone();
        let delivered = panic::catch_unwind(AssertUnwindSafe(|| finished.emit(manual)));

        self.recycle_after(id);
        if let Err(payload) = delivered {
            panic::resume_unwind(payload);
        }
    }

    fn recycle_after(&self, id: TaskId) {
        let driver = {
            let core = self.core.borrow();
            let current = matches!(
                &core.slot,
                Slot::Active(Some(state)) if state.id() == id
            );
            if !current || !core.self_recycle {
                return;
            }
            core.driver.upgrade()
        };

        let driver = match driver {
            Ok(driver) => driver,
            Err(err) => {
                tracing::warn!(task = %id, error = %err, "cannot self-recycle");
                return;
            }
        };
        if let Err(err) = self.release_to(&driver) {
            tracing::warn!(task = %id, label = err.as_label(), error = %err, "self-recycle failed");
        }
    }

    /// Returns `true` if both values refer to the same handle.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.core, &b.core)
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> Option<StateRef> {
        self.active_state()
    }
}

fn double_release() -> TaskError {
    TaskError::Pool(PoolError::DoubleRelease {
        type_name: "TaskHandle",
    })
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.core.borrow();
        let (tag, state) = match &core.slot {
            Slot::Active(state) => ("active", state),
            Slot::Idle(state) => ("idle", state),
        };
        f.debug_struct("TaskHandle")
            .field("slot", &tag)
            .field("task", &state.as_ref().map(StateRef::id))
            .field("self_recycle", &core.self_recycle)
            .field("subscribers", &core.finished.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::config::Config;
    use crate::core::FrameLoop;
    use crate::tasks::{yields, IterRoutine, RoutineFn, Step};

    fn setup() -> (Rc<FrameLoop>, Driver) {
        let frames = FrameLoop::new();
        let driver = Driver::new(Config::default(), frames.clone());
        (frames, driver)
    }

    fn forever() -> IterRoutine<std::iter::Repeat<()>> {
        IterRoutine::new(std::iter::repeat(()))
    }

    fn record(handle: &TaskHandle) -> Rc<RefCell<Vec<bool>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        handle
            .on_finished(move |manual| s.borrow_mut().push(manual))
            .unwrap();
        seen
    }

    #[test]
    fn create_without_auto_start() {
        let (frames, driver) = setup();
        let h = TaskHandle::create(&driver, yields(1), false).unwrap();
        assert!(!h.is_running());
        assert!(frames.is_idle());
        h.start().unwrap();
        assert!(h.is_running());
        assert_eq!(frames.pending(), 1);
    }

    #[test]
    fn relay_reaches_subscribers_then_recycles() {
        let (frames, driver) = setup();
        let h = TaskHandle::create(&driver, yields(0), true).unwrap();

        let observed_active = Rc::new(Cell::new(false));
        let (o, h2) = (observed_active.clone(), h.clone());
        h.on_finished(move |_| o.set(!h2.is_released())).unwrap();

        frames.tick();
        assert!(observed_active.get(), "subscribers run before the handle is pooled");
        assert!(h.is_released());
        assert_eq!(driver.idle_len::<TaskHandle>(), 1);
    }

    #[test]
    fn no_self_recycle_keeps_handle() {
        let (frames, driver) = setup();
        let h = TaskHandle::create(&driver, yields(0), false).unwrap();
        h.set_self_recycle(false);
        h.start().unwrap();
        let seen = record(&h);

        frames.run_until_idle(5);
        assert_eq!(*seen.borrow(), vec![false]);
        assert!(!h.is_released());
        assert_eq!(driver.idle_len::<TaskHandle>(), 0);

        h.release().unwrap();
        assert!(h.is_released());
        assert_eq!(driver.idle_len::<TaskHandle>(), 1);
    }

    #[test]
    fn released_handle_rejects_calls() {
        let (_frames, driver) = setup();
        let h = TaskHandle::create(&driver, forever(), true).unwrap();
        h.release().unwrap();

        assert_eq!(h.start().unwrap_err(), TaskError::Released);
        assert_eq!(h.stop().unwrap_err(), TaskError::Released);
        assert_eq!(h.pause().unwrap_err(), TaskError::Released);
        assert!(h.on_finished(|_| {}).is_err());
        assert!(!h.is_running());
        assert_eq!(h.id(), None);
        assert_eq!(h.release().unwrap_err(), double_release());
    }

    #[test]
    fn release_of_running_task_stops_it_silently() {
        let (frames, driver) = setup();
        let h = TaskHandle::create(&driver, forever(), true).unwrap();
        let seen = record(&h);
        let state = h.state().unwrap();

        frames.tick();
        h.release().unwrap();
        assert!(!state.is_running());
        assert_eq!(state.listener_count(), 0);

        frames.tick();
        assert!(state.is_finished());
        assert!(seen.borrow().is_empty());
        assert!(frames.is_idle());
    }

    #[test]
    fn reacquire_while_old_cycle_retires_allocates_new_state() {
        let (frames, driver) = setup();
        let h = TaskHandle::create(&driver, forever(), true).unwrap();
        let old = h.state().unwrap();
        frames.tick();
        h.release().unwrap();

        let again = TaskHandle::acquire(&driver, yields(0), true).unwrap();
        assert!(TaskHandle::ptr_eq(&h, &again));
        let new = again.state().unwrap();
        assert!(!StateRef::ptr_eq(&old, &new));

        let seen = record(&again);
        frames.run_until_idle(5);
        assert_eq!(*seen.borrow(), vec![false]);
        assert!(old.is_finished());
    }

    #[test]
    fn acquire_swaps_routine_into_retained_state() {
        let (frames, driver) = setup();
        let h = TaskHandle::acquire(&driver, yields(0), true).unwrap();
        let first_state = h.state().unwrap();
        let first_id = h.id().unwrap();
        frames.run_until_idle(5);
        assert!(h.is_released());

        let advanced = Rc::new(Cell::new(0));
        let a = advanced.clone();
        let again = TaskHandle::acquire(
            &driver,
            RoutineFn::new(move || {
                a.set(a.get() + 1);
                Step::Complete
            }),
            true,
        )
        .unwrap();

        assert!(TaskHandle::ptr_eq(&h, &again));
        assert!(StateRef::ptr_eq(&first_state, &again.state().unwrap()));
        assert_ne!(again.id(), Some(first_id));
        assert_eq!(first_state.listener_count(), 1, "exactly one relay");

        frames.run_until_idle(5);
        assert_eq!(advanced.get(), 1);
        let stats = driver.pool_stats::<TaskHandle>();
        assert_eq!(stats.created, 1);
        assert_eq!(stats.reused, 1);
    }

    #[test]
    fn subscriber_releasing_manually_is_not_double_released() {
        let (frames, driver) = setup();
        let h = TaskHandle::create(&driver, yields(0), true).unwrap();
        let h2 = h.clone();
        h.on_finished(move |_| h2.release().unwrap()).unwrap();

        frames.tick();
        assert!(h.is_released());
        assert_eq!(driver.pool_stats::<TaskHandle>().released, 1);
        assert_eq!(driver.idle_len::<TaskHandle>(), 1);
    }

    #[test]
    fn subscriber_reacquiring_keeps_new_lifetime_alive() {
        let (frames, driver) = setup();
        let h = TaskHandle::create(&driver, yields(0), true).unwrap();
        let next: Rc<RefCell<Option<TaskHandle>>> = Rc::new(RefCell::new(None));

        let (h2, d, n) = (h.clone(), driver.clone(), next.clone());
        h.on_finished(move |_| {
            h2.release().unwrap();
            let reused = TaskHandle::acquire(&d, forever(), true).unwrap();
            *n.borrow_mut() = Some(reused);
        })
        .unwrap();

        frames.tick();
        let reused = next.borrow_mut().take().unwrap();
        assert!(TaskHandle::ptr_eq(&h, &reused));
        assert!(!reused.is_released());
        assert!(reused.is_running());
    }

    #[test]
    fn timed_task_uses_host_clock() {
        let clock = Rc::new(crate::core::ManualClock::new());
        let frames = FrameLoop::with_clock(clock.clone());
        let driver = Driver::new(Config::default(), frames.clone());

        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let h = TaskHandle::acquire_timed(
            &driver,
            Duration::from_millis(40),
            move |t| s.borrow_mut().push(t),
            true,
        )
        .unwrap();
        let finished = record(&h);

        for _ in 0..4 {
            frames.tick();
            clock.advance(Duration::from_millis(10));
        }
        assert_eq!(seen.borrow().len(), 4);
        assert!(finished.borrow().is_empty());
        frames.tick();
        assert_eq!(*finished.borrow(), vec![false]);
    }

    #[test]
    fn debug_shows_slot() {
        let (_frames, driver) = setup();
        let h = TaskHandle::create(&driver, yields(0), false).unwrap();
        assert!(format!("{h:?}").contains("active"));
        h.release().unwrap();
        assert!(format!("{h:?}").contains("idle"));
    }
}
