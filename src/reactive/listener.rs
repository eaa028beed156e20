//! Explicit change-listener registration
//!
//! Every reactive container owns a [`Listeners`] registry. Registering a
//! listener returns a [`ListenerGuard`]; dropping the guard unregisters it.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// Change notification callback
pub type Listener = Rc<dyn Fn()>;

/// Anything that can notify listeners about changes
pub trait Observable {
    /// Register `listener`; it stays registered while the guard is alive
    fn observe(&self, listener: Listener) -> ListenerGuard;
}

impl<O: Observable + ?Sized> Observable for Rc<O> {
    fn observe(&self, listener: Listener) -> ListenerGuard {
        (**self).observe(listener)
    }
}

#[derive(Default)]
pub(crate) struct Listeners {
    next_id: Cell<u64>,
    entries: RefCell<Vec<(u64, Listener)>>,
}

impl Listeners {
    pub(crate) fn add(self: &Rc<Self>, listener: Listener) -> ListenerGuard {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.entries.borrow_mut().push((id, listener));
        ListenerGuard {
            id,
            registry: Rc::downgrade(self),
        }
    }

    /// Call every listener registered at the time of the call
    ///
    /// The entry list is copied first, so listeners may register or drop
    /// guards while being notified.
    pub(crate) fn notify(&self) {
        let listeners: Vec<Listener> = self
            .entries
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in listeners {
            listener();
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    fn remove(&self, id: u64) {
        self.entries.borrow_mut().retain(|(entry, _)| *entry != id);
    }
}

/// Keeps a listener registered; dropping it unregisters the listener
#[must_use = "the listener is removed as soon as the guard is dropped"]
pub struct ListenerGuard {
    id: u64,
    registry: Weak<Listeners>,
}

impl ListenerGuard {
    /// Whether the observed container still exists
    pub fn is_active(&self) -> bool {
        self.registry.strong_count() > 0
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }
}

impl std::fmt::Debug for ListenerGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerGuard")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_drop_unregisters() {
        let listeners = Rc::new(Listeners::default());
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let guard = listeners.add(Rc::new(move || counter.set(counter.get() + 1)));

        listeners.notify();
        assert_eq!(calls.get(), 1);

        drop(guard);
        listeners.notify();
        assert_eq!(calls.get(), 1);
        assert_eq!(listeners.len(), 0);
    }

    #[test]
    fn test_guard_outliving_registry() {
        let listeners = Rc::new(Listeners::default());
        let guard = listeners.add(Rc::new(|| {}));
        assert!(guard.is_active());
        drop(listeners);
        assert!(!guard.is_active());
    }
}
