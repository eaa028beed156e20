//! Reactive bindings from references to plain data
//!
//! [`Binder::bind`] turns a [`ReferenceSource`] into a [`Binding`] whose
//! value tracks the referenced document or query. When the source changes,
//! the binding drops its listener and subscribes to the new target on the
//! next [`Scheduler::flush`](crate::reactive::Scheduler::flush).

pub mod binder;
pub mod data;
pub mod options;
pub mod source;

pub use binder::{Binder, Binding};
pub use data::{BoundData, Record};
pub use options::{BindOptions, ErrorHandler};
pub use source::{IntoTarget, ReferenceSource};
