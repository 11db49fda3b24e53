//! # Finished-notification listener lists.
//!
//! [`Listeners`] is an explicit observer registration: `subscribe` returns a
//! [`ListenerId`], `unsubscribe` removes it. Emission tolerates listeners that
//! subscribe or unsubscribe (themselves or others) while being called; a
//! listener removed during emission is not called afterwards, and one added
//! during emission first runs on the next emission.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Identifier of a registered listener, unique within its list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Callback<A> = Box<dyn FnMut(A)>;

struct Entry<A> {
    id: ListenerId,
    // `None` while the callback is being invoked.
    callback: Option<Callback<A>>,
}

struct Inner<A> {
    next: u64,
    entries: Vec<Entry<A>>,
}

/// Shared, cloneable list of callbacks taking an `A`.
pub struct Listeners<A> {
    inner: Rc<RefCell<Inner<A>>>,
}

impl<A> Clone for Listeners<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<A> Default for Listeners<A> {
    fn default() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                next: 0,
                entries: Vec::new(),
            })),
        }
    }
}

impl<A> fmt::Debug for Listeners<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("len", &self.len())
            .finish()
    }
}

impl<A> Listeners<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `f`, returning the id needed to remove it.
    pub fn subscribe(&self, f: impl FnMut(A) + 'static) -> ListenerId {
        let mut inner = self.inner.borrow_mut();
        let id = ListenerId(inner.next);
        inner.next += 1;
        inner.entries.push(Entry {
            id,
            callback: Some(Box::new(f)),
        });
        id
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.entries.len();
        inner.entries.retain(|e| e.id != id);
        inner.entries.len() != before
    }

    /// Removes every listener.
    pub fn clear(&self) {
        self.inner.borrow_mut().entries.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<A: Copy> Listeners<A> {
    /// Calls every listener registered at the start of emission with `arg`.
    ///
    /// No borrow is held while a callback runs. A callback that panics stays
    /// registered; the panic propagates and later listeners are skipped.
    pub fn emit(&self, arg: A) {
        let ids: Vec<ListenerId> = self.inner.borrow().entries.iter().map(|e| e.id).collect();

        for id in ids {
            let taken = {
                let mut inner = self.inner.borrow_mut();
                inner
                    .entries
                    .iter_mut()
                    .find(|e| e.id == id)
                    .and_then(|e| e.callback.take())
            };
            let Some(callback) = taken else {
                continue;
            };

            let mut running = Running {
                list: self,
                id,
                callback: Some(callback),
            };
            if let Some(callback) = running.callback.as_mut() {
                callback(arg);
            }
        }
    }
}

/// Puts a callback back into its entry once it returns or unwinds, unless
/// the entry was removed meanwhile.
struct Running<'a, A> {
    list: &'a Listeners<A>,
    id: ListenerId,
    callback: Option<Callback<A>>,
}

impl<A> Drop for Running<'_, A> {
    fn drop(&mut self) {
        let mut inner = self.list.inner.borrow_mut();
        if let Some(entry) = inner.entries.iter_mut().find(|e| e.id == self.id) {
            entry.callback = self.callback.take();
        }
    }
}
