//! Firestore QuerySnapshot type

use super::document_snapshot::DocumentSnapshot;
use super::query::Query;

/// Query snapshot containing the matching documents in result order
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySnapshot {
    /// Query that produced this snapshot
    pub query: Query,

    /// Matching documents, ordered as delivered by the store
    pub documents: Vec<DocumentSnapshot>,
}

impl QuerySnapshot {
    /// Create a snapshot for `query`
    pub fn new(query: Query, documents: Vec<DocumentSnapshot>) -> Self {
        Self { query, documents }
    }

    /// Get all documents
    pub fn documents(&self) -> &[DocumentSnapshot] {
        &self.documents
    }

    /// Check if the query result is empty
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Get the number of documents in the snapshot
    pub fn len(&self) -> usize {
        self.documents.len()
    }
}

impl IntoIterator for QuerySnapshot {
    type Item = DocumentSnapshot;
    type IntoIter = std::vec::IntoIter<DocumentSnapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.into_iter()
    }
}
