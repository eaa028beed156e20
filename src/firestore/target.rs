//! Listen targets: a single document or a query

use super::collection_reference::CollectionReference;
use super::document_reference::DocumentReference;
use super::query::Query;

/// Something a snapshot listener can be attached to
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// Exactly one document
    Document(DocumentReference),
    /// Zero or more documents matching a query
    Query(Query),
}

impl Target {
    /// Path of the document or of the queried collection
    pub fn path(&self) -> &str {
        match self {
            Target::Document(reference) => reference.path(),
            Target::Query(query) => query.collection().path(),
        }
    }

    /// Whether this target yields a list of records
    pub fn is_query(&self) -> bool {
        matches!(self, Target::Query(_))
    }
}

impl From<DocumentReference> for Target {
    fn from(reference: DocumentReference) -> Self {
        Target::Document(reference)
    }
}

impl From<CollectionReference> for Target {
    fn from(collection: CollectionReference) -> Self {
        Target::Query(collection.into())
    }
}

impl From<Query> for Target {
    fn from(query: Query) -> Self {
        Target::Query(query)
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Document(reference) => write!(f, "document {reference}"),
            Target::Query(query) => write!(f, "query on {}", query.collection()),
        }
    }
}
