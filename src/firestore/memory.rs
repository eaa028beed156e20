//! In-memory snapshot store
//!
//! [`MemoryStore`] keeps documents in a `BTreeMap` keyed by path and serves
//! live listeners from it. It is single-threaded: clones share the same
//! state through an `Rc`.
//!
//! Delivery can be immediate (the initial snapshot arrives inside the listen
//! call and every write notifies synchronously) or deferred (snapshots are
//! queued until [`MemoryStore::deliver_pending`]).

use super::document_reference::DocumentReference;
use super::document_snapshot::DocumentSnapshot;
use super::listener::{DocumentCallback, ListenerRegistration, QueryCallback, SnapshotStore};
use super::query::Query;
use super::query_snapshot::QuerySnapshot;
use super::write_batch::{WriteBatch, WriteOperation};
use crate::error::FirestoreError;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::rc::{Rc, Weak};
use tracing::{debug, trace, warn};

/// When listeners receive their snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryMode {
    /// Deliver inside the listen call and inside every write
    #[default]
    Immediate,
    /// Queue deliveries until [`MemoryStore::deliver_pending`] is called
    Deferred,
}

/// Listener bookkeeping exposed for assertions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListenerStats {
    /// Successful listen calls
    pub subscribed: usize,
    /// Registrations removed by their owner
    pub unsubscribed: usize,
    /// Listeners currently registered
    pub active: usize,
}

#[derive(Debug, Clone)]
struct StoredDocument {
    fields: Map<String, Value>,
    update_time: DateTime<Utc>,
}

#[derive(Clone)]
enum ListenerEntry {
    Document {
        reference: DocumentReference,
        callback: DocumentCallback,
    },
    Query {
        query: Query,
        callback: QueryCallback,
    },
}

#[derive(Default)]
struct MemoryInner {
    documents: RefCell<BTreeMap<String, StoredDocument>>,
    listeners: RefCell<BTreeMap<u64, ListenerEntry>>,
    pending: RefCell<VecDeque<u64>>,
    next_listener_id: Cell<u64>,
    delivery: Cell<DeliveryMode>,
    fail_next_listen: RefCell<Option<FirestoreError>>,
    subscribed: Cell<usize>,
    unsubscribed: Cell<usize>,
}

/// In-process [`SnapshotStore`] backed by a sorted document map
///
/// # Example
/// ```
/// use reactive_firestore::firestore::{DocumentReference, MemoryStore};
/// use serde_json::json;
///
/// let store = MemoryStore::new();
/// let alice = DocumentReference::new("users/alice").unwrap();
/// store.set(&alice, json!({"name": "Alice"})).unwrap();
/// assert!(store.get(&alice).exists());
/// ```
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Rc<MemoryInner>,
}

impl MemoryStore {
    /// Empty store with immediate delivery
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty store with the given delivery mode
    pub fn with_delivery(delivery: DeliveryMode) -> Self {
        let store = Self::new();
        store.inner.delivery.set(delivery);
        store
    }

    /// Current delivery mode
    pub fn delivery(&self) -> DeliveryMode {
        self.inner.delivery.get()
    }

    /// Create a new write batch
    pub fn batch(&self) -> WriteBatch {
        WriteBatch::new(self.clone())
    }

    /// Set document data (overwrites existing document)
    pub fn set(&self, reference: &DocumentReference, data: Value) -> Result<(), FirestoreError> {
        self.batch().set(reference, data)?.commit()
    }

    /// Merge fields into an existing document
    pub fn update(&self, reference: &DocumentReference, data: Value) -> Result<(), FirestoreError> {
        self.batch().update(reference, data)?.commit()
    }

    /// Delete the document; deleting a missing document is not an error
    pub fn delete(&self, reference: &DocumentReference) -> Result<(), FirestoreError> {
        self.batch().delete(reference).commit()
    }

    /// Read the current state of a document
    pub fn get(&self, reference: &DocumentReference) -> DocumentSnapshot {
        let documents = self.inner.documents.borrow();
        match documents.get(reference.path()) {
            Some(stored) => DocumentSnapshot::new(reference.clone(), Some(stored.fields.clone()))
                .with_update_time(stored.update_time),
            None => DocumentSnapshot::missing(reference.clone()),
        }
    }

    /// Run a query against the current state
    pub fn run_query(&self, query: &Query) -> QuerySnapshot {
        let prefix = format!("{}/", query.collection().path());
        let candidates: Vec<DocumentSnapshot> = self
            .inner
            .documents
            .borrow()
            .range(prefix.clone()..)
            .take_while(|(path, _)| path.starts_with(&prefix))
            .filter(|(path, _)| query.contains_path(path))
            .map(|(path, stored)| {
                DocumentSnapshot::new(
                    DocumentReference::from_validated(path.clone()),
                    Some(stored.fields.clone()),
                )
                .with_update_time(stored.update_time)
            })
            .collect();
        QuerySnapshot::new(query.clone(), query.apply(candidates))
    }

    /// Make the next listen call fail synchronously with `error`
    pub fn fail_next_listen(&self, error: FirestoreError) {
        *self.inner.fail_next_listen.borrow_mut() = Some(error);
    }

    /// Deliver `error` to every listener and drop them, as the backend does
    /// when it terminates a watch stream
    pub fn fail_listeners(&self, error: FirestoreError) {
        let entries: Vec<ListenerEntry> = std::mem::take(&mut *self.inner.listeners.borrow_mut())
            .into_values()
            .collect();
        self.inner.pending.borrow_mut().clear();
        warn!(listeners = entries.len(), %error, "terminating all listeners");
        for entry in entries {
            match entry {
                ListenerEntry::Document { callback, .. } => callback(Err(error.clone())),
                ListenerEntry::Query { callback, .. } => callback(Err(error.clone())),
            }
        }
    }

    /// Deliver queued snapshots; returns how many were delivered
    ///
    /// Snapshots reflect the state at delivery time, and a listener queued
    /// several times receives a single snapshot.
    pub fn deliver_pending(&self) -> usize {
        let mut delivered = 0;
        loop {
            let next = self.inner.pending.borrow_mut().pop_front();
            let Some(id) = next else {
                break;
            };
            if self.deliver(id) {
                delivered += 1;
            }
        }
        delivered
    }

    /// Number of listeners waiting for a deferred delivery
    pub fn pending_deliveries(&self) -> usize {
        self.inner.pending.borrow().len()
    }

    /// Listener counters
    pub fn stats(&self) -> ListenerStats {
        ListenerStats {
            subscribed: self.inner.subscribed.get(),
            unsubscribed: self.inner.unsubscribed.get(),
            active: self.inner.listeners.borrow().len(),
        }
    }

    pub(crate) fn apply(&self, operations: Vec<WriteOperation>) -> Result<(), FirestoreError> {
        let now = Utc::now();
        let mut touched = BTreeSet::new();
        {
            let mut documents = self.inner.documents.borrow_mut();
            let mut staged = documents.clone();
            for operation in operations {
                let path = operation.reference().path().to_string();
                match operation {
                    WriteOperation::Set { data, .. } => {
                        staged.insert(path.clone(), StoredDocument { fields: data, update_time: now });
                    }
                    WriteOperation::Update { data, .. } => {
                        let Some(stored) = staged.get_mut(&path) else {
                            return Err(FirestoreError::NotFound);
                        };
                        stored.fields.extend(data);
                        stored.update_time = now;
                    }
                    WriteOperation::Delete { .. } => {
                        staged.remove(&path);
                    }
                }
                touched.insert(path);
            }
            *documents = staged;
        }
        debug!(documents = touched.len(), "applied writes");
        self.notify(&touched);
        Ok(())
    }

    fn notify(&self, touched: &BTreeSet<String>) {
        let affected: Vec<u64> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .filter(|(_, entry)| match entry {
                ListenerEntry::Document { reference, .. } => touched.contains(reference.path()),
                ListenerEntry::Query { query, .. } => touched.iter().any(|p| query.contains_path(p)),
            })
            .map(|(id, _)| *id)
            .collect();

        for id in affected {
            self.schedule(id);
        }
    }

    fn schedule(&self, id: u64) {
        match self.inner.delivery.get() {
            DeliveryMode::Immediate => {
                self.deliver(id);
            }
            DeliveryMode::Deferred => {
                let mut pending = self.inner.pending.borrow_mut();
                if !pending.contains(&id) {
                    pending.push_back(id);
                }
            }
        }
    }

    /// Invoke the listener's callback with a fresh snapshot
    ///
    /// No borrow is held while the callback runs, so callbacks may write to
    /// the store or remove registrations.
    fn deliver(&self, id: u64) -> bool {
        let entry = self.inner.listeners.borrow().get(&id).cloned();
        let Some(entry) = entry else {
            return false;
        };
        match entry {
            ListenerEntry::Document { reference, callback } => {
                let snapshot = self.get(&reference);
                trace!(listener = id, path = reference.path(), exists = snapshot.exists(), "delivering document snapshot");
                callback(Ok(snapshot));
            }
            ListenerEntry::Query { query, callback } => {
                let snapshot = self.run_query(&query);
                trace!(listener = id, path = query.collection().path(), documents = snapshot.len(), "delivering query snapshot");
                callback(Ok(snapshot));
            }
        }
        true
    }

    fn register(&self, entry: ListenerEntry) -> Result<ListenerRegistration, FirestoreError> {
        if let Some(error) = self.inner.fail_next_listen.borrow_mut().take() {
            return Err(error);
        }

        let id = self.inner.next_listener_id.get();
        self.inner.next_listener_id.set(id + 1);
        self.inner.listeners.borrow_mut().insert(id, entry);
        self.inner.subscribed.set(self.inner.subscribed.get() + 1);
        debug!(listener = id, "listener added");

        let weak: Weak<MemoryInner> = Rc::downgrade(&self.inner);
        let registration = ListenerRegistration::new(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            inner.listeners.borrow_mut().remove(&id);
            inner.pending.borrow_mut().retain(|pending| *pending != id);
            inner.unsubscribed.set(inner.unsubscribed.get() + 1);
            debug!(listener = id, "listener removed");
        });

        self.schedule(id);
        Ok(registration)
    }
}

impl SnapshotStore for MemoryStore {
    fn listen_document(
        &self,
        reference: &DocumentReference,
        callback: DocumentCallback,
    ) -> Result<ListenerRegistration, FirestoreError> {
        self.register(ListenerEntry::Document {
            reference: reference.clone(),
            callback,
        })
    }

    fn listen_query(
        &self,
        query: &Query,
        callback: QueryCallback,
    ) -> Result<ListenerRegistration, FirestoreError> {
        self.register(ListenerEntry::Query {
            query: query.clone(),
            callback,
        })
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("documents", &self.inner.documents.borrow().len())
            .field("delivery", &self.inner.delivery.get())
            .field("stats", &self.stats())
            .finish()
    }
}
