//! Snapshot listener contract
//!
//! A [`SnapshotStore`] registers a callback for a document or a query and
//! hands back a [`ListenerRegistration`]. The callback is invoked with an
//! initial snapshot and then on every change, until the registration is
//! removed. Delivery may happen inside the listen call or at any later point.

use super::document_reference::DocumentReference;
use super::document_snapshot::DocumentSnapshot;
use super::query::Query;
use super::query_snapshot::QuerySnapshot;
use super::target::Target;
use crate::error::FirestoreError;
use std::rc::Rc;

/// Callback receiving document snapshots or listener errors
pub type DocumentCallback = Rc<dyn Fn(Result<DocumentSnapshot, FirestoreError>)>;

/// Callback receiving query snapshots or listener errors
pub type QueryCallback = Rc<dyn Fn(Result<QuerySnapshot, FirestoreError>)>;

/// Handle for removing a snapshot listener
///
/// `remove` consumes the handle, so a registration can be removed at most
/// once. Dropping it without calling `remove` leaves the listener active.
pub struct ListenerRegistration {
    remove: Box<dyn FnOnce()>,
}

impl ListenerRegistration {
    /// Wrap the store-specific removal action
    pub fn new(remove: impl FnOnce() + 'static) -> Self {
        Self {
            remove: Box::new(remove),
        }
    }

    /// Removes the listener and stops receiving updates
    pub fn remove(self) {
        (self.remove)();
    }
}

impl std::fmt::Debug for ListenerRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistration").finish_non_exhaustive()
    }
}

/// Remote store able to stream live snapshots
///
/// Implementations report malformed targets synchronously through the
/// returned `Result`. Later failures go to the callback as `Err`, after
/// which the store stops delivering to that callback.
pub trait SnapshotStore {
    /// Adds a real-time listener to a single document
    fn listen_document(
        &self,
        reference: &DocumentReference,
        callback: DocumentCallback,
    ) -> Result<ListenerRegistration, FirestoreError>;

    /// Adds a real-time listener to a query result set
    fn listen_query(
        &self,
        query: &Query,
        callback: QueryCallback,
    ) -> Result<ListenerRegistration, FirestoreError>;
}

impl<S: SnapshotStore + ?Sized> SnapshotStore for Rc<S> {
    fn listen_document(
        &self,
        reference: &DocumentReference,
        callback: DocumentCallback,
    ) -> Result<ListenerRegistration, FirestoreError> {
        (**self).listen_document(reference, callback)
    }

    fn listen_query(
        &self,
        query: &Query,
        callback: QueryCallback,
    ) -> Result<ListenerRegistration, FirestoreError> {
        (**self).listen_query(query, callback)
    }
}

/// Listener callback for either kind of target
#[derive(Clone)]
pub enum SnapshotCallback {
    /// Callback for [`Target::Document`]
    Document(DocumentCallback),
    /// Callback for [`Target::Query`]
    Query(QueryCallback),
}

/// Dispatch a listen request for `target` to the matching store method
///
/// # Errors
/// [`FirestoreError::InvalidArgument`] when the callback kind does not match
/// the target kind, or whatever the store reports synchronously.
pub fn listen(
    store: &dyn SnapshotStore,
    target: &Target,
    callback: SnapshotCallback,
) -> Result<ListenerRegistration, FirestoreError> {
    match (target, callback) {
        (Target::Document(reference), SnapshotCallback::Document(callback)) => {
            store.listen_document(reference, callback)
        }
        (Target::Query(query), SnapshotCallback::Query(callback)) => {
            store.listen_query(query, callback)
        }
        (target, _) => Err(FirestoreError::InvalidArgument(format!(
            "callback kind does not match target {target}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_remove_runs_action_once() {
        let removed = Rc::new(Cell::new(0));
        let counter = Rc::clone(&removed);
        let registration = ListenerRegistration::new(move || counter.set(counter.get() + 1));
        registration.remove();
        assert_eq!(removed.get(), 1);
    }

    #[test]
    fn test_drop_without_remove_keeps_listener() {
        let removed = Rc::new(Cell::new(false));
        let flag = Rc::clone(&removed);
        drop(ListenerRegistration::new(move || flag.set(true)));
        assert!(!removed.get());
    }
}
