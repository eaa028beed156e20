//! Single-threaded reactive primitives
//!
//! - [`Signal`] / [`ReadSignal`]: mutable value and its read-only view
//! - [`Derived`]: lazily recomputed value with explicit dependencies
//! - [`Scheduler`]: deferred, coalescing job queue ("next tick")
//! - [`SignalStream`]: async stream of a signal's values
//!
//! Dependencies are never tracked implicitly. Consumers register listeners
//! through [`Observable::observe`] and keep the returned [`ListenerGuard`].

pub mod derived;
pub mod listener;
pub mod scheduler;
pub mod signal;
/// Stream adapter for signals
pub mod stream;

pub use derived::Derived;
pub use listener::{Listener, ListenerGuard, Observable};
pub use scheduler::{Job, JobId, Scheduler};
pub use signal::{ReadSignal, Signal};
pub use stream::SignalStream;
