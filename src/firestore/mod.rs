//! Document store model
//!
//! References, queries and snapshots, plus the [`SnapshotStore`] seam that
//! live listeners go through. [`MemoryStore`] is the in-process
//! implementation.
//!
//! # Module layout
//! - `document_reference.rs` / `collection_reference.rs`: validated paths
//! - `query.rs`: filters and ordering over a collection
//! - `document_snapshot.rs` / `query_snapshot.rs`: delivered data
//! - `target.rs`: what a listener is attached to
//! - `listener.rs`: [`SnapshotStore`] and [`ListenerRegistration`]
//! - `memory.rs`: [`MemoryStore`]
//! - `write_batch.rs`: atomic writes

pub mod collection_reference;
pub mod document_reference;
pub mod document_snapshot;
pub mod listener;
/// In-memory store with live listeners
pub mod memory;
mod path;
pub mod query;
pub mod query_snapshot;
pub mod target;
pub mod write_batch;

// Re-export from reference modules
pub use collection_reference::CollectionReference;
pub use document_reference::DocumentReference;

// Re-export from snapshot modules
pub use document_snapshot::DocumentSnapshot;
pub use query_snapshot::QuerySnapshot;

// Re-export from query module
pub use query::{Direction, FilterCondition, Query};

// Re-export from listener module
pub use listener::{
    listen, DocumentCallback, ListenerRegistration, QueryCallback, SnapshotCallback, SnapshotStore,
};

// Re-export from memory module
pub use memory::{DeliveryMode, ListenerStats, MemoryStore};

pub use target::Target;

// Re-export from write_batch module
pub use write_batch::{WriteBatch, WriteOperation};
