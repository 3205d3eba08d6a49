use keel_datastore::DatastoreError;
use keel_dispatch::DispatchError;
use keel_types::EntityId;

/// Errors from store, model, and transaction operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The entity key is absent where a read, save, or delete expected it.
    #[error("instance not found: {0}")]
    NotFound(EntityId),

    /// A create targeted an entity key that is already live.
    #[error("instance already exists: {0}")]
    AlreadyExists(EntityId),

    /// A mutating operation was attempted inside a read transaction.
    #[error("read-only transaction")]
    ReadOnlyTransaction,

    /// An operation or commit was attempted on a discarded or committed
    /// transaction.
    #[error("transaction already discarded or committed")]
    TransactionClosed,

    /// A model with the same name is already registered.
    #[error("model already registered: {0}")]
    DuplicateModel(String),

    /// The model name cannot form a namespace.
    #[error("invalid model name: {0:?}")]
    InvalidModelName(String),

    /// Merge-patch generation failed against the stored bytes.
    #[error("patch error for {entity}: {reason}")]
    Patch { entity: EntityId, reason: String },

    /// Instance or operation (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The underlying datastore failed.
    #[error(transparent)]
    Datastore(#[from] DatastoreError),

    /// Dispatch failed during commit or replay.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}
