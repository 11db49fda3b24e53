//! # Driver configuration.
//!
//! Provides [`Config`], centralized settings for a [`Driver`](crate::Driver).
//!
//! Config is used in two ways:
//! 1. **Driver creation**: `Driver::builder(config)`
//! 2. **Handle defaults**: new handles inherit [`Config::self_recycle`]
//!
//! ## Sentinel values
//! - `pool_limit = 0` → unbounded idle set
//! - `tick_interval = 0s` → the tokio pump yields between ticks instead of sleeping

use std::time::Duration;

/// Configuration for a [`Driver`](crate::Driver) and its tick pump.
///
/// ## Field semantics
/// - `self_recycle`: default for new handles (`true` = return to the pool after `Finished`)
/// - `pool_limit`: maximum idle instances kept per pooled type (`0` = unbounded)
/// - `tick_interval`: period of [`drive`](crate::drive) (`0s` = as fast as the runtime allows)
#[derive(Clone, Debug)]
pub struct Config {
    /// Whether handles return themselves to the pool once their finished
    /// notification has been delivered.
    ///
    /// Can be changed per handle with
    /// [`TaskHandle::set_self_recycle`](crate::TaskHandle::set_self_recycle).
    pub self_recycle: bool,

    /// Maximum number of idle instances kept per pooled type.
    ///
    /// Instances released into a full pool are marked idle and dropped.
    pub pool_limit: usize,

    /// Period between ticks when the loop is pumped by [`drive`](crate::drive).
    pub tick_interval: Duration,
}

impl Config {
    /// Returns the idle-set cap as an `Option`.
    ///
    /// - `None` → unbounded
    /// - `Some(n)` → at most `n` idle instances per type
    #[inline]
    pub fn pool_limit(&self) -> Option<usize> {
        if self.pool_limit == 0 {
            None
        } else {
            Some(self.pool_limit)
        }
    }

    /// Returns the tick period as an `Option`.
    ///
    /// - `None` → yield to the runtime between ticks
    /// - `Some(d)` → one tick every `d`
    #[inline]
    pub fn tick_period(&self) -> Option<Duration> {
        if self.tick_interval == Duration::ZERO {
            None
        } else {
            Some(self.tick_interval)
        }
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `self_recycle = true`
    /// - `pool_limit = 0` (unbounded)
    /// - `tick_interval = 16ms` (roughly one frame at 60Hz)
    fn default() -> Self {
        Self {
            self_recycle: true,
            pool_limit: 0,
            tick_interval: Duration::from_millis(16),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels() {
        let mut cfg = Config::default();
        assert_eq!(cfg.pool_limit(), None);
        assert_eq!(cfg.tick_period(), Some(Duration::from_millis(16)));

        cfg.pool_limit = 4;
        cfg.tick_interval = Duration::ZERO;
        assert_eq!(cfg.pool_limit(), Some(4));
        assert_eq!(cfg.tick_period(), None);
    }
}
