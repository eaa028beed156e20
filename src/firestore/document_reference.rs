//! Firestore DocumentReference type

use super::collection_reference::CollectionReference;
use super::path::{self, PathKind};
use crate::error::FirestoreError;

/// Reference to a single Firestore document
///
/// A reference is only a validated path. Reading or listening goes through a
/// [`SnapshotStore`](super::SnapshotStore).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentReference {
    path: String,
}

impl DocumentReference {
    /// Create a new document reference
    ///
    /// # Errors
    /// [`FirestoreError::InvalidPath`] if the path is empty, contains an
    /// empty segment (`"users//alice"`) or has an odd number of segments.
    ///
    /// # Example
    /// ```
    /// use reactive_firestore::firestore::DocumentReference;
    ///
    /// let doc = DocumentReference::new("users/alice").unwrap();
    /// assert_eq!(doc.id(), "alice");
    /// assert!(DocumentReference::new("users//alice").is_err());
    /// ```
    pub fn new(path: impl Into<String>) -> Result<Self, FirestoreError> {
        let path = path.into();
        path::validate(&path, PathKind::Document)?;
        Ok(Self { path })
    }

    /// Full document path (e.g., "users/alice")
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Get the document ID (last segment of path)
    pub fn id(&self) -> &str {
        path::last_segment(&self.path)
    }

    /// Get the collection containing this document
    pub fn parent(&self) -> CollectionReference {
        let parent = path::parent(&self.path).unwrap_or_default();
        CollectionReference::from_validated(parent.to_string())
    }

    /// Get a subcollection of this document
    pub fn collection(&self, collection_id: impl AsRef<str>) -> Result<CollectionReference, FirestoreError> {
        let collection_id = collection_id.as_ref();
        path::validate_id(collection_id)?;
        Ok(CollectionReference::from_validated(format!("{}/{}", self.path, collection_id)))
    }

    pub(crate) fn from_validated(path: String) -> Self {
        Self { path }
    }
}

impl std::fmt::Display for DocumentReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path)
    }
}
