use serde::de::DeserializeOwned;
use serde::Serialize;

use keel_types::EntityId;

/// Capability trait for record types stored in a model.
///
/// Replaces the runtime reflection the concept comes from: instead of
/// locating an `ID` field at runtime, a record type states how its entity id
/// is read and written. Everything else the store needs (marshalling,
/// instantiating a fresh record on read) falls out of the serde bounds.
///
/// ```
/// use keel_store::Instance;
/// use keel_types::EntityId;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, Serialize, Deserialize)]
/// struct Person {
///     id: EntityId,
///     name: String,
///     age: u32,
/// }
///
/// impl Instance for Person {
///     fn entity_id(&self) -> &EntityId {
///         &self.id
///     }
///
///     fn set_entity_id(&mut self, id: EntityId) {
///         self.id = id;
///     }
/// }
/// ```
pub trait Instance: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The record's entity id.
    fn entity_id(&self) -> &EntityId;

    /// Write a generated id back into the record.
    ///
    /// Called by [`crate::Txn::create`] when the record arrives with the
    /// unassigned sentinel.
    fn set_entity_id(&mut self, id: EntityId);
}
