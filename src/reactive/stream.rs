//! Async stream of signal values
//!
//! Each change notification pushes a clone of the new value into an
//! unbounded channel. The stream owns the listener guard, so dropping the
//! stream unregisters the listener (RAII pattern).

use super::listener::{ListenerGuard, Observable};
use super::signal::Signal;
use futures::Stream;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// A stream of values emitted by a signal after each change
///
/// # Example
/// ```
/// use futures::StreamExt;
/// use reactive_firestore::reactive::Signal;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let signal = Signal::new(0);
/// let mut changes = signal.read_only().changes();
/// signal.set(1);
/// assert_eq!(changes.next().await, Some(1));
/// # }
/// ```
pub struct SignalStream<T> {
    receiver: mpsc::UnboundedReceiver<T>,
    _guard: ListenerGuard,
}

impl<T: Clone + 'static> SignalStream<T> {
    pub(crate) fn new(signal: &Signal<T>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let weak = Rc::downgrade(&signal.inner);
        let guard = signal.observe(Rc::new(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let value = inner.value.borrow().clone();
            // Receiver gone means the stream was dropped mid-notification
            let _ = sender.send(value);
        }));
        Self {
            receiver,
            _guard: guard,
        }
    }
}

impl<T> Stream for SignalStream<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_stream_yields_each_change() {
        let signal = Signal::new(String::from("a"));
        let mut changes = signal.read_only().changes();

        signal.set("b".into());
        signal.set("c".into());
        assert_eq!(changes.next().await.as_deref(), Some("b"));
        assert_eq!(changes.next().await.as_deref(), Some("c"));
    }

    #[tokio::test]
    async fn test_drop_unregisters_listener() {
        let signal = Signal::new(0);
        {
            let _changes = signal.read_only().changes();
            assert_eq!(signal.listener_count(), 1);
        }
        assert_eq!(signal.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_stream_ends_with_signal() {
        let signal = Signal::new(0);
        let mut changes = signal.read_only().changes();
        signal.set(7);
        drop(signal);
        assert_eq!(changes.next().await, Some(7));
        assert_eq!(changes.next().await, None);
    }
}
