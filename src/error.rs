//! Error types for store construction and field access.

use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by [`Store`](crate::Store) construction and field access.
///
/// Every variant is a programming error on the caller's side: a key that the
/// store never declared, or a declaration that cannot be satisfied. Situations
/// that are part of normal operation (nobody observing an entity, removing a
/// listener twice) are reported as `bool` results instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The key was not declared when the store was built.
    #[error("unknown key `{key}`")]
    UnknownKey {
        /// The offending key.
        key: String,
    },

    /// The same key was declared twice.
    #[error("key `{key}` is declared more than once")]
    DuplicateKey {
        /// The repeated key.
        key: String,
    },

    /// A schema key has no value in the initial state.
    #[error("no initial value for declared key `{key}`")]
    MissingInitialValue {
        /// The key without a value.
        key: String,
    },

    /// A projection was declared without any path segment.
    #[error("projection `{key}` has an empty path")]
    EmptyPath {
        /// The projected key.
        key: String,
    },

    /// A projection points at a location that does not exist in the source.
    #[error("projection `{key}` points at missing path `{path}`")]
    PathNotFound {
        /// The projected key.
        key: String,
        /// Dotted form of the path that failed to resolve.
        path: String,
    },

    /// A store can only be built from a JSON object.
    #[error("expected a JSON object, found {found}")]
    NotAnObject {
        /// JSON type name of the rejected value.
        found: &'static str,
    },
}

impl StoreError {
    /// Create an unknown key error.
    #[inline]
    pub fn unknown_key(key: impl Into<String>) -> Self {
        StoreError::UnknownKey { key: key.into() }
    }

    /// Create a duplicate key error.
    #[inline]
    pub fn duplicate_key(key: impl Into<String>) -> Self {
        StoreError::DuplicateKey { key: key.into() }
    }

    /// Create a missing initial value error.
    #[inline]
    pub fn missing_initial_value(key: impl Into<String>) -> Self {
        StoreError::MissingInitialValue { key: key.into() }
    }

    /// Create a path not found error.
    #[inline]
    pub fn path_not_found(key: impl Into<String>, path: impl Into<String>) -> Self {
        StoreError::PathNotFound {
            key: key.into(),
            path: path.into(),
        }
    }

    /// The key this error refers to, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            StoreError::UnknownKey { key }
            | StoreError::DuplicateKey { key }
            | StoreError::MissingInitialValue { key }
            | StoreError::EmptyPath { key }
            | StoreError::PathNotFound { key, .. } => Some(key),
            StoreError::NotAnObject { .. } => None,
        }
    }
}
