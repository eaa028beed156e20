//! Error types
//!
//! Provides a unified error type hierarchy for reference construction,
//! snapshot listeners and reactive bindings.
//!
//! # Design
//! Uses thiserror for ergonomic error definitions. All errors implement
//! std::error::Error and can be converted to [`Error`] via From trait.

use thiserror::Error;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
///
/// Wraps module-specific errors into a unified type.
///
/// # Example
/// ```
/// use reactive_firestore::{Error, FirestoreError};
///
/// let err: Error = FirestoreError::PermissionDenied.into();
/// assert!(matches!(err, Error::Firestore(FirestoreError::PermissionDenied)));
/// ```
#[derive(Debug, Error)]
pub enum Error {
    /// Firestore-related errors (invalid references, listener failures)
    #[error("Firestore error: {0}")]
    Firestore(#[from] FirestoreError),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Firestore errors
///
/// Errors raised while building references or reported by snapshot listeners.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FirestoreError {
    /// Malformed document or collection path
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Document not found
    #[error("Document not found")]
    NotFound,

    /// Permission denied
    #[error("Permission denied")]
    PermissionDenied,

    /// Service unavailable
    #[error("Service unavailable")]
    Unavailable,

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an internal error from a string
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl FirestoreError {
    /// Create an invalid-path error from a message
    pub fn invalid_path(msg: impl Into<String>) -> Self {
        Self::InvalidPath(msg.into())
    }
}
