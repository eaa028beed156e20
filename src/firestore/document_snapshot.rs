//! Firestore DocumentSnapshot type

use super::document_reference::DocumentReference;
use super::query::lookup;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// Firestore document snapshot
///
/// Field data is `None` when the document does not exist.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    /// Document reference
    pub reference: DocumentReference,

    /// Document data (None if document doesn't exist)
    pub data: Option<Map<String, Value>>,

    /// Time of the last write to the document, if known
    pub update_time: Option<DateTime<Utc>>,
}

impl DocumentSnapshot {
    /// Snapshot of an existing or missing document without write time
    pub fn new(reference: DocumentReference, data: Option<Map<String, Value>>) -> Self {
        Self {
            reference,
            data,
            update_time: None,
        }
    }

    /// Snapshot of a document that does not exist
    pub fn missing(reference: DocumentReference) -> Self {
        Self::new(reference, None)
    }

    /// Attach the time of the last write
    pub fn with_update_time(mut self, update_time: DateTime<Utc>) -> Self {
        self.update_time = Some(update_time);
        self
    }

    /// Check if document exists
    pub fn exists(&self) -> bool {
        self.data.is_some()
    }

    /// Get a field value by (dotted) path
    pub fn get(&self, field: &str) -> Option<&Value> {
        let Some(data) = &self.data else {
            return None;
        };
        lookup(data, field)
    }

    /// Get document ID
    pub fn id(&self) -> &str {
        self.reference.id()
    }
}
