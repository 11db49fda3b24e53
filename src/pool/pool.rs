//! # Free list for one pooled type.
//!
//! [`Pool`] hands out idle instances before constructing new ones and guards
//! against an instance entering the idle set twice.
//!
//! ## Rules
//! - `get` never returns an instance that is still marked idle
//! - `release` of an idle instance fails with [`PoolError::DoubleRelease`]
//!   and leaves the idle set untouched
//! - With a limit, instances released into a full pool are marked idle and dropped

use std::any;

use crate::error::PoolError;

/// Types that can live in a [`Pool`].
///
/// The idle bit is owned by the implementor so that a clone held elsewhere can
/// still observe that the instance was released.
pub trait Recycle: Default {
    /// Returns `true` while the instance sits in (or was evicted from) the idle set.
    fn is_idle(&self) -> bool;

    /// Sets or clears the idle bit.
    fn set_idle(&mut self, idle: bool);
}

/// Counters describing pool traffic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Instances constructed because the idle set was empty.
    pub created: u64,
    /// Instances handed out from the idle set.
    pub reused: u64,
    /// Successful releases.
    pub released: u64,
    /// Releases dropped because the idle set was full.
    pub evicted: u64,
    /// Current idle set size.
    pub idle: usize,
}

/// Free list of idle `T`s.
#[derive(Debug)]
pub struct Pool<T> {
    idle: Vec<T>,
    limit: Option<usize>,
    stats: PoolStats,
}

impl<T: Recycle> Pool<T> {
    /// Creates an empty pool. `limit = None` keeps every released instance.
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            idle: Vec::new(),
            limit,
            stats: PoolStats::default(),
        }
    }

    /// Returns an idle instance, or a freshly constructed one.
    ///
    /// The returned instance is never marked idle.
    pub fn get(&mut self) -> T {
        match self.idle.pop() {
            Some(mut item) => {
                item.set_idle(false);
                self.stats.reused += 1;
                item
            }
            None => {
                self.stats.created += 1;
                T::default()
            }
        }
    }

    /// Returns `item` to the idle set.
    pub fn release(&mut self, mut item: T) -> Result<(), PoolError> {
        if item.is_idle() {
            return Err(PoolError::DoubleRelease {
                type_name: short_type_name::<T>(),
            });
        }
        item.set_idle(true);
        self.stats.released += 1;

        if self.limit.is_some_and(|limit| self.idle.len() >= limit) {
            self.stats.evicted += 1;
            tracing::trace!(pool = short_type_name::<T>(), "pool full, dropping released instance");
            return Ok(());
        }
        self.idle.push(item);
        Ok(())
    }

    /// Number of idle instances.
    pub fn idle_len(&self) -> usize {
        self.idle.len()
    }

    /// Snapshot of the pool counters.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            idle: self.idle.len(),
            ..self.stats
        }
    }

    /// Iterates the idle set, most recently released last.
    pub fn iter_idle(&self) -> impl Iterator<Item = &T> {
        self.idle.iter()
    }
}

/// `tickvisor::tasks::handle::TaskHandle` → `TaskHandle`.
fn short_type_name<T>() -> &'static str {
    let full = any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}
