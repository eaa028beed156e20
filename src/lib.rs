//! Reactive Firestore bindings
//!
//! Binds a document or query reference (static, held in a [`Signal`], or
//! computed by a [`Derived`]) to a reactive value that always reflects the
//! referenced data. Changing the reference swaps the underlying snapshot
//! listener; clearing it reverts the value to a default.
//!
//! # Example
//! ```
//! use reactive_firestore::firestore::{DocumentReference, MemoryStore};
//! use reactive_firestore::reactive::{Scheduler, Signal};
//! use reactive_firestore::{Binder, BoundData};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryStore::new();
//! let scheduler = Scheduler::new();
//! let binder = Binder::new(store.clone(), scheduler.clone());
//!
//! let alice = DocumentReference::new("users/alice")?;
//! store.set(&alice, json!({"name": "Alice"}))?;
//!
//! let user = Signal::new(None::<DocumentReference>);
//! let binding = binder.bind(user.clone(), BoundData::Empty)?;
//! assert!(binding.get().is_null());
//!
//! user.set(Some(alice));
//! scheduler.flush()?;
//! assert_eq!(binding.get().to_value(), json!({"name": "Alice", "id": "alice"}));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;

// Document store model and the in-memory store
pub mod firestore;

// Signals, derived values and the scheduler
pub mod reactive;

// Reference-to-data bindings
pub mod binding;

// Re-exports for convenience
pub use error::{Error, FirestoreError, Result};

pub use binding::{BindOptions, Binder, Binding, BoundData, ErrorHandler, IntoTarget, Record, ReferenceSource};
pub use firestore::{CollectionReference, DocumentReference, MemoryStore, Query, SnapshotStore, Target};
pub use reactive::{Derived, ReadSignal, Scheduler, Signal};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_types_exist() {
        // Basic smoke test
        let _err: Error = FirestoreError::PermissionDenied.into();
    }
}
