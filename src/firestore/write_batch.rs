//! WriteBatch type for the in-memory store
//!
//! Operations are collected first and applied atomically on `commit`:
//! either every operation is applied or none is, and listeners are notified
//! once per commit.

use super::document_reference::DocumentReference;
use super::memory::MemoryStore;
use crate::error::FirestoreError;
use serde_json::{Map, Value};

/// Write batch for atomic operations
#[must_use = "a write batch does nothing until committed"]
pub struct WriteBatch {
    operations: Vec<WriteOperation>,
    store: MemoryStore,
}

/// Write operations for batch writes
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOperation {
    /// Set (overwrite) a document
    Set {
        /// Target document
        reference: DocumentReference,
        /// Document data
        data: Map<String, Value>,
    },
    /// Update specific fields in a document (document must exist)
    Update {
        /// Target document
        reference: DocumentReference,
        /// Fields to update
        data: Map<String, Value>,
    },
    /// Delete a document
    Delete {
        /// Document to delete
        reference: DocumentReference,
    },
}

impl WriteOperation {
    /// Document touched by this operation
    pub fn reference(&self) -> &DocumentReference {
        match self {
            WriteOperation::Set { reference, .. }
            | WriteOperation::Update { reference, .. }
            | WriteOperation::Delete { reference } => reference,
        }
    }
}

/// Convert a JSON value into document fields
pub(crate) fn into_fields(data: Value) -> Result<Map<String, Value>, FirestoreError> {
    match data {
        Value::Object(fields) => Ok(fields),
        other => Err(FirestoreError::InvalidArgument(format!(
            "document data must be an object, got {other}"
        ))),
    }
}

impl WriteBatch {
    pub(crate) fn new(store: MemoryStore) -> Self {
        Self {
            operations: Vec::new(),
            store,
        }
    }

    /// Set document data (overwrites existing document)
    ///
    /// # Errors
    /// [`FirestoreError::InvalidArgument`] if `data` is not a JSON object.
    pub fn set(mut self, reference: &DocumentReference, data: Value) -> Result<Self, FirestoreError> {
        self.operations.push(WriteOperation::Set {
            reference: reference.clone(),
            data: into_fields(data)?,
        });
        Ok(self)
    }

    /// Update document fields (document must exist at commit time)
    ///
    /// # Errors
    /// [`FirestoreError::InvalidArgument`] if `data` is not a JSON object.
    pub fn update(mut self, reference: &DocumentReference, data: Value) -> Result<Self, FirestoreError> {
        self.operations.push(WriteOperation::Update {
            reference: reference.clone(),
            data: into_fields(data)?,
        });
        Ok(self)
    }

    /// Delete document
    pub fn delete(mut self, reference: &DocumentReference) -> Self {
        self.operations.push(WriteOperation::Delete {
            reference: reference.clone(),
        });
        self
    }

    /// Commit all operations atomically
    ///
    /// # Errors
    /// [`FirestoreError::NotFound`] if an update targets a missing document;
    /// nothing is written in that case.
    pub fn commit(self) -> Result<(), FirestoreError> {
        self.store.apply(self.operations)
    }

    /// Check if batch is empty
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Get number of operations
    pub fn len(&self) -> usize {
        self.operations.len()
    }
}
