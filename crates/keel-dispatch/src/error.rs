use keel_datastore::DatastoreError;

use crate::reducer::Token;

/// Errors produced by dispatch and reduction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// Deregistration was attempted with a token that is not registered.
    #[error("unknown registration token: {0}")]
    UnknownToken(Token),

    /// A reducer could not decode an event body addressed to it.
    #[error("malformed event: {0}")]
    MalformedEvent(String),

    /// Event encoding or stored-state decoding failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The dispatcher's registry lock was poisoned.
    #[error("dispatcher lock poisoned")]
    LockPoisoned,

    /// The event store or a reducer's datastore failed.
    #[error(transparent)]
    Datastore(#[from] DatastoreError),
}
