//! # Type-keyed pool store.
//!
//! [`Pools`] holds one [`Pool`] per requested type, created on first use.
//! A [`Driver`](crate::Driver) owns one `Pools`; every handle bound to that
//! driver shares it.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use crate::error::PoolError;
use crate::pool::{Pool, PoolStats, Recycle};

/// Free lists keyed by type.
#[derive(Default)]
pub struct Pools {
    limit: Option<usize>,
    pools: HashMap<TypeId, Box<dyn Any>>,
}

impl Pools {
    /// Creates an empty store; `limit` applies to every pool it creates.
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            limit,
            pools: HashMap::new(),
        }
    }

    /// Returns an idle `T` or constructs one.
    pub fn get<T: Recycle + 'static>(&mut self) -> T {
        self.pool_mut::<T>().get()
    }

    /// Returns `item` to the idle set of its type.
    pub fn release<T: Recycle + 'static>(&mut self, item: T) -> Result<(), PoolError> {
        self.pool_mut::<T>().release(item)
    }

    /// Counters for `T`'s pool (all zero if it was never used).
    pub fn stats<T: Recycle + 'static>(&self) -> PoolStats {
        self.pool::<T>().map(Pool::stats).unwrap_or_default()
    }

    /// Idle instances of `T`.
    pub fn idle_len<T: Recycle + 'static>(&self) -> usize {
        self.pool::<T>().map_or(0, Pool::idle_len)
    }

    /// Returns `T`'s pool, if any instance of `T` went through this store.
    pub fn pool<T: Recycle + 'static>(&self) -> Option<&Pool<T>> {
        self.pools
            .get(&TypeId::of::<T>())
            .and_then(|p| p.downcast_ref::<Pool<T>>())
    }

    fn pool_mut<T: Recycle + 'static>(&mut self) -> &mut Pool<T> {
        let limit = self.limit;
        self.pools
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(Pool::<T>::new(limit)))
            .downcast_mut::<Pool<T>>()
            .expect("pool registered under the TypeId of another type")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct A(bool);
    #[derive(Default)]
    struct B(bool);

    impl Recycle for A {
        fn is_idle(&self) -> bool {
            self.0
        }
        fn set_idle(&mut self, idle: bool) {
            self.0 = idle;
        }
    }

    impl Recycle for B {
        fn is_idle(&self) -> bool {
            self.0
        }
        fn set_idle(&mut self, idle: bool) {
            self.0 = idle;
        }
    }

    #[test]
    fn pools_are_keyed_by_type() {
        let mut pools = Pools::new(None);
        let a = pools.get::<A>();
        pools.release(a).unwrap();

        assert_eq!(pools.idle_len::<A>(), 1);
        assert_eq!(pools.idle_len::<B>(), 0);
        assert!(pools.pool::<B>().is_none());

        let _b = pools.get::<B>();
        assert_eq!(pools.stats::<B>().created, 1);
        assert_eq!(pools.stats::<A>().released, 1);
    }

    #[test]
    fn limit_is_shared_by_all_types() {
        let mut pools = Pools::new(Some(1));
        pools.release(A::default()).unwrap();
        pools.release(A::default()).unwrap();
        pools.release(B::default()).unwrap();
        assert_eq!(pools.idle_len::<A>(), 1);
        assert_eq!(pools.stats::<A>().evicted, 1);
        assert_eq!(pools.idle_len::<B>(), 1);
    }
}
