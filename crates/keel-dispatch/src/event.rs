use serde::{Deserialize, Serialize};

use keel_types::{EntityId, SchemaRef, Timestamp};

/// An immutable record of one mutation.
///
/// Events carry the wall-clock timestamp captured at commit, the entity they
/// concern, the schema reference that routes them to the owning model's
/// reducer, and an opaque body. The dispatcher never inspects the body; for
/// model events it is the JSON-marshalled staged operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Commit timestamp (nanoseconds since epoch).
    pub timestamp: Timestamp,
    /// The entity this event mutates.
    pub entity: EntityId,
    /// Schema discriminator used for reducer routing.
    pub schema: SchemaRef,
    /// Opaque payload bytes.
    pub body: Vec<u8>,
}

impl Event {
    /// Build a new event.
    pub fn new(timestamp: Timestamp, entity: EntityId, schema: SchemaRef, body: Vec<u8>) -> Self {
        Self {
            timestamp,
            entity,
            schema,
            body,
        }
    }
}
