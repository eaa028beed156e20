//! Firestore CollectionReference type

use super::document_reference::DocumentReference;
use super::path::{self, PathKind};
use super::query::Query;
use crate::error::FirestoreError;

/// Reference to a Firestore collection
///
/// Listening to a collection means listening to the unfiltered [`Query`]
/// over it; use [`CollectionReference::query`] to add filters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionReference {
    path: String,
}

impl CollectionReference {
    /// Create a new collection reference
    ///
    /// # Errors
    /// [`FirestoreError::InvalidPath`] if the path is malformed or points at
    /// a document.
    pub fn new(path: impl Into<String>) -> Result<Self, FirestoreError> {
        let path = path.into();
        path::validate(&path, PathKind::Collection)?;
        Ok(Self { path })
    }

    pub(crate) fn from_validated(path: String) -> Self {
        Self { path }
    }

    /// Full collection path
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Get collection ID (last segment of path)
    pub fn id(&self) -> &str {
        path::last_segment(&self.path)
    }

    /// Parent document for subcollections, `None` for root collections
    pub fn parent(&self) -> Option<DocumentReference> {
        path::parent(&self.path).map(|parent| DocumentReference::from_validated(parent.to_string()))
    }

    /// Get a document reference within this collection
    pub fn doc(&self, document_id: impl AsRef<str>) -> Result<DocumentReference, FirestoreError> {
        let document_id = document_id.as_ref();
        path::validate_id(document_id)?;
        Ok(DocumentReference::from_validated(format!("{}/{}", self.path, document_id)))
    }

    /// Start a query over this collection
    pub fn query(&self) -> Query {
        Query::new(self.clone())
    }
}

impl From<CollectionReference> for Query {
    fn from(collection: CollectionReference) -> Self {
        Query::new(collection)
    }
}

impl std::fmt::Display for CollectionReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_reference_parts() {
        let posts = CollectionReference::new("users/alice/posts").unwrap();
        assert_eq!(posts.id(), "posts");
        assert_eq!(posts.parent().unwrap().path(), "users/alice");
        assert!(CollectionReference::new("users").unwrap().parent().is_none());
    }

    #[test]
    fn test_doc() {
        let users = CollectionReference::new("users").unwrap();
        assert_eq!(users.doc("bob").unwrap().path(), "users/bob");
        assert!(users.doc("").is_err());
    }

    #[test]
    fn test_invalid_segment() {
        let err = CollectionReference::new("users//posts").unwrap_err();
        assert!(err.to_string().contains("Invalid segment"));
    }
}
