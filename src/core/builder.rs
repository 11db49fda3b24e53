use std::rc::Rc;

use crate::{
    config::Config,
    error::DriverError,
    events::Bus,
    subscribers::Subscribe,
};
use super::{
    driver::{Driver, HostFactory},
    host::Host,
};

/// Builder for constructing a [`Driver`].
pub struct DriverBuilder {
    cfg: Config,
    subscribers: Vec<Rc<dyn Subscribe>>,
    factory: Option<HostFactory>,
}

impl DriverBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            factory: None,
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive driver events (host init, task lifecycle, pool
    /// traffic) synchronously on the driving thread.
    pub fn with_subscribers(mut self, subscribers: Vec<Rc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Uses an already constructed host.
    pub fn with_host(self, host: Rc<dyn Host>) -> Self {
        self.with_host_factory(move || Ok(host))
    }

    /// Creates the host lazily, on the first task creation.
    ///
    /// An error from `factory` is fatal for the driver.
    pub fn with_host_factory<F>(mut self, factory: F) -> Self
    where
        F: FnOnce() -> Result<Rc<dyn Host>, DriverError> + 'static,
    {
        self.factory = Some(Box::new(factory));
        self
    }

    /// Builds the driver.
    ///
    /// Without a host or host factory the driver is unusable: the first task
    /// creation fails with [`DriverError::Unavailable`].
    pub fn build(self) -> Driver {
        let bus = Bus::new(self.subscribers);
        let factory: HostFactory = match self.factory {
            Some(factory) => factory,
            None => Box::new(|| {
                Err(DriverError::Unavailable {
                    reason: "no host configured".to_string(),
                })
            }),
        };
        Driver::from_parts(self.cfg, factory, bus)
    }
}
