use serde::{Deserialize, Serialize};
use serde_json::Value;

use keel_datastore::Key;
use keel_types::EntityId;

/// Kind discriminator of a staged operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Upsert,
    Delete,
}

/// One staged mutation, and the wire shape of an event body.
///
/// An upsert's `patch` is either the full JSON of a new instance (create) or
/// an RFC 7396 merge-patch delta (save); the reducer distinguishes the two
/// by whether the entity key is already live. A delete carries no patch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(rename = "type")]
    pub kind: OperationKind,
    pub entity: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<Value>,
}

impl Operation {
    /// Stage an upsert carrying `patch`.
    pub fn upsert(entity: EntityId, patch: Value) -> Self {
        Self {
            kind: OperationKind::Upsert,
            entity,
            patch: Some(patch),
        }
    }

    /// Stage a delete.
    pub fn delete(entity: EntityId) -> Self {
        Self {
            kind: OperationKind::Delete,
            entity,
            patch: None,
        }
    }
}

/// The materialized-state key for an entity: `/<escaped entity id>`.
///
/// Entity ids are opaque strings and may contain `/`, which [`Key::new`]
/// would fold into path structure. Escaping `%` and `/` keeps the whole id
/// inside one key segment, so distinct ids never alias one storage key.
pub(crate) fn instance_key(entity: &EntityId) -> Key {
    let escaped = entity.as_str().replace('%', "%25").replace('/', "%2F");
    Key::new(&escaped)
}
