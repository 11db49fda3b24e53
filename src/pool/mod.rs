//! # Reuse pools.
//!
//! - [`Recycle`] - idle bookkeeping a pooled type carries
//! - [`Pool`] - free list for one type, with a double-release guard
//! - [`Pools`] - per-driver store of pools keyed by type
//! - [`PoolStats`] - traffic counters

#[allow(clippy::module_inception)]
mod pool;
mod registry;

pub use pool::{Pool, PoolStats, Recycle};
pub use registry::Pools;
