/// Errors from datastore operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DatastoreError {
    /// A lock guarding the store was poisoned by a panicking writer.
    #[error("datastore lock poisoned")]
    LockPoisoned,

    /// The underlying backend failed.
    #[error("datastore backend error: {0}")]
    Backend(String),
}

/// Result alias for datastore operations.
pub type DatastoreResult<T> = Result<T, DatastoreError>;
