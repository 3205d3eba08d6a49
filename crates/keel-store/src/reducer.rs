use serde_json::Value;
use tracing::debug;

use keel_datastore::{Datastore, Namespaced};
use keel_dispatch::{DispatchError, Event, Reducer};
use keel_patch::apply_patch;
use keel_types::SchemaRef;

use crate::operation::{instance_key, Operation, OperationKind};

/// Applies a model's events to its materialized namespace.
///
/// Owns only the schema reference and the namespace handle. It is invoked
/// under the dispatcher's lock while the committing transaction still holds
/// the model lock, so it must never reach back into the model or transaction
/// machinery.
pub(crate) struct ModelReducer {
    schema: SchemaRef,
    namespace: Namespaced,
}

impl ModelReducer {
    pub(crate) fn new(schema: SchemaRef, namespace: Namespaced) -> Self {
        Self { schema, namespace }
    }
}

impl Reducer for ModelReducer {
    fn reduce(&self, event: &Event) -> Result<(), DispatchError> {
        if event.schema != self.schema {
            return Ok(());
        }

        let op: Operation = serde_json::from_slice(&event.body)
            .map_err(|e| DispatchError::MalformedEvent(e.to_string()))?;
        let key = instance_key(&op.entity);

        match op.kind {
            OperationKind::Upsert => {
                let patch = op
                    .patch
                    .as_ref()
                    .ok_or_else(|| DispatchError::MalformedEvent("upsert without patch".into()))?;

                match self.namespace.get(&key)? {
                    // Absent slot: the patch is the full record of a create.
                    None => {
                        let bytes = serde_json::to_vec(patch)
                            .map_err(|e| DispatchError::Serialization(e.to_string()))?;
                        self.namespace.put(&key, bytes)?;
                        debug!(schema = %self.schema, entity = %op.entity, "insert applied");
                    }
                    Some(current_bytes) => {
                        let current: Value = serde_json::from_slice(&current_bytes)
                            .map_err(|e| DispatchError::Serialization(e.to_string()))?;
                        let patched = apply_patch(&current, patch);
                        let bytes = serde_json::to_vec(&patched)
                            .map_err(|e| DispatchError::Serialization(e.to_string()))?;
                        self.namespace.put(&key, bytes)?;
                        debug!(schema = %self.schema, entity = %op.entity, "update applied");
                    }
                }
            }
            OperationKind::Delete => {
                self.namespace.delete(&key)?;
                debug!(schema = %self.schema, entity = %op.entity, "delete applied");
            }
        }

        Ok(())
    }
}
