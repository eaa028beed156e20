//! Lazily recomputed values

use super::listener::{Listener, ListenerGuard, Listeners, Observable};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

struct DerivedInner<T> {
    compute: Box<dyn Fn() -> T>,
    cached: RefCell<Option<T>>,
    dirty: Cell<bool>,
    listeners: Rc<Listeners>,
    dependencies: RefCell<Vec<ListenerGuard>>,
}

impl<T> DerivedInner<T> {
    /// Mark stale; listeners hear about it only on the clean → dirty edge
    fn invalidate(&self) {
        if self.dirty.replace(true) {
            return;
        }
        self.listeners.notify();
    }
}

/// Value computed from other reactive containers
///
/// Dependencies are registered explicitly with [`Derived::track`]. A change
/// in any dependency marks the value dirty and notifies listeners once; the
/// computation itself runs on the next read.
///
/// # Example
/// ```
/// use reactive_firestore::reactive::{Derived, Signal};
///
/// let first = Signal::new(2);
/// let second = Signal::new(3);
/// let (a, b) = (first.clone(), second.clone());
/// let sum = Derived::new(move || a.get() + b.get()).track(&first).track(&second);
///
/// assert_eq!(sum.get(), 5);
/// second.set(10);
/// assert_eq!(sum.get(), 12);
/// ```
pub struct Derived<T> {
    inner: Rc<DerivedInner<T>>,
}

impl<T> Clone for Derived<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static> Derived<T> {
    /// Create a derived value from a computation
    pub fn new(compute: impl Fn() -> T + 'static) -> Self {
        Self {
            inner: Rc::new(DerivedInner {
                compute: Box::new(compute),
                cached: RefCell::new(None),
                dirty: Cell::new(true),
                listeners: Rc::new(Listeners::default()),
                dependencies: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Register `dependency` and return self, for builder-style setup
    pub fn track(self, dependency: &dyn Observable) -> Self {
        self.depends_on(dependency);
        self
    }

    /// Register an additional dependency
    pub fn depends_on(&self, dependency: &dyn Observable) {
        let weak: Weak<DerivedInner<T>> = Rc::downgrade(&self.inner);
        let guard = dependency.observe(Rc::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.invalidate();
            }
        }));
        self.inner.dependencies.borrow_mut().push(guard);
    }

    /// Use the current value, recomputing it first when stale
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        if self.inner.dirty.get() || self.inner.cached.borrow().is_none() {
            let value = (self.inner.compute)();
            *self.inner.cached.borrow_mut() = Some(value);
            self.inner.dirty.set(false);
        }
        let cached = self.inner.cached.borrow();
        match cached.as_ref() {
            Some(value) => f(value),
            None => unreachable!("derived value computed above"),
        }
    }

    /// Whether the next read will recompute
    pub fn is_dirty(&self) -> bool {
        self.inner.dirty.get()
    }

    /// Derived value computed from this one
    pub fn map<U: 'static>(&self, f: impl Fn(&T) -> U + 'static) -> Derived<U> {
        let source = self.clone();
        Derived::new(move || source.with(&f)).track(self)
    }
}

impl<T: Clone + 'static> Derived<T> {
    /// Clone the current value
    pub fn get(&self) -> T {
        self.with(T::clone)
    }
}

impl<T: 'static> Observable for Derived<T> {
    fn observe(&self, listener: Listener) -> ListenerGuard {
        self.inner.listeners.add(listener)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Signal;

    #[test]
    fn test_lazy_recompute() {
        let source = Signal::new(1);
        let runs = Rc::new(Cell::new(0));
        let (reader, counter) = (source.clone(), Rc::clone(&runs));
        let doubled = Derived::new(move || {
            counter.set(counter.get() + 1);
            reader.get() * 2
        })
        .track(&source);

        assert_eq!(runs.get(), 0);
        assert_eq!(doubled.get(), 2);
        assert_eq!(doubled.get(), 2);
        assert_eq!(runs.get(), 1);

        source.set(5);
        assert!(doubled.is_dirty());
        assert_eq!(runs.get(), 1);
        assert_eq!(doubled.get(), 10);
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn test_notifies_once_until_read() {
        let source = Signal::new(1);
        let doubled = source.map(|v| v * 2);
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let _guard = doubled.observe(Rc::new(move || counter.set(counter.get() + 1)));

        doubled.get();
        source.set(2);
        source.set(3);
        assert_eq!(calls.get(), 1);

        assert_eq!(doubled.get(), 6);
        source.set(4);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_chained_derived() {
        let source = Signal::new(String::from("ab"));
        let len = source.map(|s| s.len());
        let is_long = len.map(|n| *n > 3);
        assert!(!is_long.get());
        source.set("abcdef".into());
        assert!(is_long.get());
    }

    #[test]
    fn test_dropping_derived_unregisters_from_source() {
        let source = Signal::new(1);
        let doubled = source.map(|v| v * 2);
        assert_eq!(source.listener_count(), 1);
        drop(doubled);
        assert_eq!(source.listener_count(), 0);
    }
}
