//! Resource path validation
//!
//! Document paths have an even number of segments (`users/alice`),
//! collection paths an odd number (`users`, `users/alice/posts`).

use crate::error::FirestoreError;

/// Kind of resource a path must point at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PathKind {
    Document,
    Collection,
}

/// Validate `path` for the given kind and return its segments
pub(crate) fn validate(path: &str, kind: PathKind) -> Result<Vec<&str>, FirestoreError> {
    if path.is_empty() {
        return Err(FirestoreError::invalid_path("path must not be empty"));
    }
    if path.starts_with('/') || path.ends_with('/') {
        return Err(FirestoreError::invalid_path(format!(
            "path must not start or end with '/': {path}"
        )));
    }

    let segments: Vec<&str> = path.split('/').collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(FirestoreError::invalid_path(format!(
            "Invalid segment ({path}): paths must not contain '//'"
        )));
    }

    let is_document = segments.len() % 2 == 0;
    match (kind, is_document) {
        (PathKind::Document, false) => Err(FirestoreError::invalid_path(format!(
            "document path must have an even number of segments, but {path} has {}",
            segments.len()
        ))),
        (PathKind::Collection, true) => Err(FirestoreError::invalid_path(format!(
            "collection path must have an odd number of segments, but {path} has {}",
            segments.len()
        ))),
        _ => Ok(segments),
    }
}

/// Validate a single path segment used as a child id
pub(crate) fn validate_id(id: &str) -> Result<(), FirestoreError> {
    if id.is_empty() || id.contains('/') {
        return Err(FirestoreError::invalid_path(format!(
            "id must be a single non-empty segment: {id:?}"
        )));
    }
    Ok(())
}

/// Last segment of an already validated path
pub(crate) fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Everything before the last segment of an already validated path
pub(crate) fn parent(path: &str) -> Option<&str> {
    path.rsplit_once('/').map(|(parent, _)| parent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_paths() {
        assert_eq!(validate("users/alice", PathKind::Document).unwrap(), ["users", "alice"]);
        assert!(validate("users", PathKind::Document).is_err());
        assert!(validate("users/alice/posts/1", PathKind::Document).is_ok());
    }

    #[test]
    fn test_collection_paths() {
        assert!(validate("users", PathKind::Collection).is_ok());
        assert!(validate("users/alice/posts", PathKind::Collection).is_ok());
        assert!(validate("users/alice", PathKind::Collection).is_err());
    }

    #[test]
    fn test_malformed_paths() {
        for path in ["", "/users", "users/", "users//posts"] {
            let err = validate(path, PathKind::Collection).unwrap_err();
            assert!(matches!(err, FirestoreError::InvalidPath(_)), "{path}");
        }
    }

    #[test]
    fn test_segments() {
        assert_eq!(last_segment("users/alice"), "alice");
        assert_eq!(parent("users/alice"), Some("users"));
        assert_eq!(parent("users"), None);
        assert!(validate_id("a/b").is_err());
        assert!(validate_id("").is_err());
        assert!(validate_id("alice").is_ok());
    }
}
