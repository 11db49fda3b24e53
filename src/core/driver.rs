//! # Driver: the scheduler's shared state.
//!
//! A [`Driver`] is the single component that talks to the [`Host`]. It is an
//! explicitly constructed, cheaply cloneable value passed to every task
//! factory, not an implicit global.
//!
//! ## Responsibilities
//! - **Lazy host**: the host is created on the first task creation, exactly
//!   once, from the factory given to the builder. A failing factory makes the
//!   driver permanently unusable and the failure is returned to that first
//!   caller and every caller after it.
//! - **Cycle registration**: [`Driver::begin_cycle`] is the only path from a
//!   task state to the host's per-tick primitive.
//! - **Pooling**: owns the type-keyed [`Pools`] shared by its handles.
//! - **Events**: owns the [`Bus`] its subscribers are attached to.
//!
//! ## Example
//! ```rust
//! use tickvisor::{yields, Config, Driver, FrameLoop, TaskHandle};
//!
//! let frames = FrameLoop::new();
//! let driver = Driver::builder(Config::default()).with_host(frames.clone()).build();
//! assert!(!driver.is_initialized());
//!
//! let task = TaskHandle::create(&driver, yields(1), true)?;
//! assert!(driver.is_initialized());
//! assert!(task.is_running());
//!
//! frames.run_until_idle(10);
//! assert!(task.is_released());
//! # Ok::<(), tickvisor::TaskError>(())
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use once_cell::unsync::OnceCell;

use crate::config::Config;
use crate::core::builder::DriverBuilder;
use crate::core::host::{Clock, Host};
use crate::error::{DriverError, PoolError, TaskError};
use crate::events::{Bus, Event, EventKind};
use crate::pool::{PoolStats, Pools, Recycle};
use crate::tasks::{Routine, StateRef, TaskId};

/// Fallible, run-once host constructor.
pub(crate) type HostFactory = Box<dyn FnOnce() -> Result<Rc<dyn Host>, DriverError>>;

pub(crate) struct DriverInner {
    cfg: Config,
    factory: RefCell<Option<HostFactory>>,
    host: OnceCell<Rc<dyn Host>>,
    failure: RefCell<Option<DriverError>>,
    pools: RefCell<Pools>,
    bus: Bus,
    next_id: Cell<u64>,
}

/// Shared scheduler state. Clones refer to the same driver.
#[derive(Clone)]
pub struct Driver {
    inner: Rc<DriverInner>,
}

impl Driver {
    /// Starts building a driver.
    pub fn builder(cfg: Config) -> DriverBuilder {
        DriverBuilder::new(cfg)
    }

    /// Shorthand for a driver over an existing host with no subscribers.
    pub fn new(cfg: Config, host: Rc<dyn Host>) -> Self {
        DriverBuilder::new(cfg).with_host(host).build()
    }

    pub(crate) fn from_parts(cfg: Config, factory: HostFactory, bus: Bus) -> Self {
        let pools = Pools::new(cfg.pool_limit());
        Self {
            inner: Rc::new(DriverInner {
                cfg,
                factory: RefCell::new(Some(factory)),
                host: OnceCell::new(),
                failure: RefCell::new(None),
                pools: RefCell::new(pools),
                bus,
                next_id: Cell::new(0),
            }),
        }
    }

    /// Driver configuration.
    pub fn config(&self) -> &Config {
        &self.inner.cfg
    }

    /// Event bus of this driver.
    pub fn bus(&self) -> &Bus {
        &self.inner.bus
    }

    /// Returns `true` once the host was created successfully.
    pub fn is_initialized(&self) -> bool {
        self.inner.host.get().is_some()
    }

    /// Returns the host, creating it on first use.
    pub fn host(&self) -> Result<Rc<dyn Host>, DriverError> {
        self.inner
            .host
            .get_or_try_init(|| self.init_host())
            .map(Rc::clone)
    }

    /// Clock of the host, creating the host on first use.
    pub fn clock(&self) -> Result<Rc<dyn Clock>, DriverError> {
        Ok(self.host()?.clock())
    }

    fn init_host(&self) -> Result<Rc<dyn Host>, DriverError> {
        let factory = self.inner.factory.borrow_mut().take();
        let Some(factory) = factory else {
            return Err(self.inner.failure.borrow().clone().unwrap_or_else(|| {
                DriverError::Unavailable {
                    reason: "host factory missing".to_string(),
                }
            }));
        };

        match factory() {
            Ok(host) => {
                tracing::debug!("host initialized");
                self.publish(Event::new(EventKind::HostInitialized));
                Ok(host)
            }
            Err(err) => {
                tracing::error!(error = %err, "host initialization failed");
                self.publish(Event::new(EventKind::HostUnavailable).with_reason(err.to_string()));
                *self.inner.failure.borrow_mut() = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Allocates the next task id.
    pub(crate) fn next_id(&self) -> TaskId {
        let id = self.inner.next_id.get() + 1;
        self.inner.next_id.set(id);
        TaskId::from_raw(id)
    }

    /// Allocates a task state, bringing the host up if this is the first one.
    pub(crate) fn create_state(
        &self,
        id: TaskId,
        routine: Box<dyn Routine>,
    ) -> Result<StateRef, DriverError> {
        self.host()?;
        tracing::trace!(task = %id, "task state allocated");
        Ok(StateRef::new(id, routine))
    }

    /// Marks `state` running and registers its cycle with the host.
    ///
    /// The first re-entry happens on the host's next tick.
    pub(crate) fn begin_cycle(&self, state: &StateRef) -> Result<(), TaskError> {
        let host = self.host()?;
        let cycle = state.start(&self.inner.bus)?;
        host.register(Box::new(cycle));

        let id = state.id();
        tracing::debug!(task = %id, "task started");
        self.publish(Event::new(EventKind::TaskStarted).with_task(id));
        Ok(())
    }

    pub(crate) fn publish(&self, event: Event) {
        self.inner.bus.publish(event);
    }

    pub(crate) fn pool_get<T: Recycle + 'static>(&self) -> T {
        self.inner.pools.borrow_mut().get::<T>()
    }

    pub(crate) fn pool_release<T: Recycle + 'static>(&self, item: T) -> Result<(), PoolError> {
        self.inner.pools.borrow_mut().release(item)
    }

    /// Counters of `T`'s pool.
    pub fn pool_stats<T: Recycle + 'static>(&self) -> PoolStats {
        self.inner.pools.borrow().stats::<T>()
    }

    /// Idle instances of `T` ready for reuse.
    pub fn idle_len<T: Recycle + 'static>(&self) -> usize {
        self.inner.pools.borrow().idle_len::<T>()
    }

    pub(crate) fn downgrade(&self) -> WeakDriver {
        WeakDriver(Rc::downgrade(&self.inner))
    }

    /// Returns `true` if both values refer to the same driver.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }
}

impl fmt::Debug for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Driver")
            .field("cfg", &self.inner.cfg)
            .field("initialized", &self.is_initialized())
            .field("subscribers", &self.inner.bus.len())
            .field("tasks_created", &self.inner.next_id.get())
            .finish()
    }
}

/// Non-owning back reference from a handle to its driver.
///
/// Pooled handles live inside the driver, so they must not keep it alive.
#[derive(Clone, Default)]
pub(crate) struct WeakDriver(Weak<DriverInner>);

impl WeakDriver {
    pub(crate) fn upgrade(&self) -> Result<Driver, DriverError> {
        self.0
            .upgrade()
            .map(|inner| Driver { inner })
            .ok_or(DriverError::Dropped)
    }
}
