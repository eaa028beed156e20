//! Mutable reactive containers

use super::derived::Derived;
use super::listener::{Listener, ListenerGuard, Listeners, Observable};
use super::stream::SignalStream;
use std::cell::RefCell;
use std::rc::Rc;

pub(crate) struct SignalInner<T> {
    pub(crate) value: RefCell<T>,
    pub(crate) listeners: Rc<Listeners>,
}

/// Mutable value that notifies listeners on every write
///
/// Clones share the same value. Listeners run synchronously inside `set`,
/// after the new value has been stored.
///
/// # Example
/// ```
/// use reactive_firestore::reactive::Signal;
/// use std::{cell::Cell, rc::Rc};
///
/// let count = Signal::new(1);
/// let seen = Rc::new(Cell::new(0));
/// let sink = Rc::clone(&seen);
/// let reader = count.clone();
/// let _guard = count.subscribe(move || sink.set(reader.get()));
///
/// count.set(5);
/// assert_eq!(seen.get(), 5);
/// ```
pub struct Signal<T> {
    pub(crate) inner: Rc<SignalInner<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static> Signal<T> {
    /// Create a signal holding `value`
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(SignalInner {
                value: RefCell::new(value),
                listeners: Rc::new(Listeners::default()),
            }),
        }
    }

    /// Use the current value without cloning it
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&*self.inner.value.borrow())
    }

    /// Replace the value and notify listeners
    pub fn set(&self, value: T) {
        *self.inner.value.borrow_mut() = value;
        self.inner.listeners.notify();
    }

    /// Replace the value, returning the previous one, and notify listeners
    pub fn replace(&self, value: T) -> T {
        let previous = self.inner.value.replace(value);
        self.inner.listeners.notify();
        previous
    }

    /// Mutate the value in place and notify listeners
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let result = {
            let mut value = self.inner.value.borrow_mut();
            f(&mut *value)
        };
        self.inner.listeners.notify();
        result
    }

    /// Register a change listener
    pub fn subscribe(&self, listener: impl Fn() + 'static) -> ListenerGuard {
        self.observe(Rc::new(listener))
    }

    /// Read-only view sharing this signal's value
    pub fn read_only(&self) -> ReadSignal<T> {
        ReadSignal {
            signal: self.clone(),
        }
    }

    /// Derived value recomputed from this signal
    pub fn map<U: 'static>(&self, f: impl Fn(&T) -> U + 'static) -> Derived<U> {
        let source = self.clone();
        Derived::new(move || source.with(&f)).track(self)
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }

    /// Whether both handles point at the same container
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: Clone + 'static> Signal<T> {
    /// Clone the current value
    pub fn get(&self) -> T {
        self.with(T::clone)
    }
}

impl<T: PartialEq + 'static> Signal<T> {
    /// Store `value` and notify only if it differs from the current one
    ///
    /// Returns whether listeners were notified.
    pub fn set_if_changed(&self, value: T) -> bool {
        if self.with(|current| *current == value) {
            return false;
        }
        self.set(value);
        true
    }
}

impl<T: 'static> Observable for Signal<T> {
    fn observe(&self, listener: Listener) -> ListenerGuard {
        self.inner.listeners.add(listener)
    }
}

impl<T: std::fmt::Debug + 'static> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.with(|value| f.debug_tuple("Signal").field(value).finish())
    }
}

/// Read-only view of a [`Signal`]
///
/// Observers can read and subscribe but cannot write.
pub struct ReadSignal<T> {
    signal: Signal<T>,
}

impl<T> Clone for ReadSignal<T> {
    fn clone(&self) -> Self {
        Self {
            signal: self.signal.clone(),
        }
    }
}

impl<T: 'static> ReadSignal<T> {
    /// Use the current value without cloning it
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.signal.with(f)
    }

    /// Register a change listener
    pub fn subscribe(&self, listener: impl Fn() + 'static) -> ListenerGuard {
        self.signal.subscribe(listener)
    }

    /// Derived value recomputed from this signal
    pub fn map<U: 'static>(&self, f: impl Fn(&T) -> U + 'static) -> Derived<U> {
        self.signal.map(f)
    }

    /// Whether both views share the same container
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.signal.ptr_eq(&other.signal)
    }
}

impl<T: Clone + 'static> ReadSignal<T> {
    /// Clone the current value
    pub fn get(&self) -> T {
        self.signal.get()
    }

    /// Stream of values, one per change notification
    ///
    /// The listener is unregistered when the stream is dropped, and the
    /// stream ends once the signal itself is gone.
    pub fn changes(&self) -> SignalStream<T> {
        SignalStream::new(&self.signal)
    }
}

impl<T: 'static> Observable for ReadSignal<T> {
    fn observe(&self, listener: Listener) -> ListenerGuard {
        self.signal.observe(listener)
    }
}

impl<T: std::fmt::Debug + 'static> std::fmt::Debug for ReadSignal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.with(|value| f.debug_tuple("ReadSignal").field(value).finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_set_notifies_after_store() {
        let signal = Signal::new(String::from("a"));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let (sink, reader) = (Rc::clone(&seen), signal.clone());
        let _guard = signal.subscribe(move || sink.borrow_mut().push(reader.get()));

        signal.set("b".into());
        signal.update(|value| value.push('c'));
        assert_eq!(signal.replace("d".into()), "bc");
        assert_eq!(*seen.borrow(), ["b", "bc", "d"]);
    }

    #[test]
    fn test_set_if_changed() {
        let signal = Signal::new(1);
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let _guard = signal.subscribe(move || counter.set(counter.get() + 1));

        assert!(!signal.set_if_changed(1));
        assert!(signal.set_if_changed(2));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_listener_may_write_other_signal() {
        let source = Signal::new(1);
        let mirror = Signal::new(0);
        let (reader, writer) = (source.clone(), mirror.clone());
        let _guard = source.subscribe(move || writer.set(reader.get() * 10));

        source.set(4);
        assert_eq!(mirror.get(), 40);
    }

    #[test]
    fn test_read_only_shares_identity() {
        let signal = Signal::new(3);
        let view = signal.read_only();
        signal.set(9);
        assert_eq!(view.get(), 9);
        assert!(view.ptr_eq(&signal.read_only()));
        assert!(!view.ptr_eq(&Signal::new(9).read_only()));
    }

    #[test]
    fn test_dropped_guard_stops_notifications() {
        let signal = Signal::new(0);
        let guard = signal.subscribe(|| {});
        assert_eq!(signal.listener_count(), 1);
        drop(guard);
        assert_eq!(signal.listener_count(), 0);
    }
}
