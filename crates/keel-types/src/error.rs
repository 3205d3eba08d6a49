use thiserror::Error;

/// Errors produced by parsing foundation types from external input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    /// The empty string is reserved as the unassigned sentinel.
    #[error("entity id must not be empty")]
    EmptyEntityId,

    /// The string is not a valid schema reference wire form.
    #[error("invalid schema reference: {0:?}")]
    InvalidSchemaRef(String),
}
