use serde_json::Value;
use tracing::debug;

use keel_datastore::{Datastore, Query};
use keel_dispatch::Event;
use keel_patch::diff_values;
use keel_types::{EntityId, Timestamp};

use crate::error::StoreError;
use crate::instance::Instance;
use crate::model::Model;
use crate::operation::{instance_key, Operation, OperationKind};

/// A scoped buffer of staged operations against one model.
///
/// Obtained through [`Model::read`] or [`Model::write`]; the model's lock is
/// held for the transaction's whole lifetime. Staged operations validate
/// against the *materialized* state and become visible only after commit
/// dispatches them, so reads inside the transaction observe the pre-commit
/// state.
///
/// Staging is insertion-ordered with at most one operation per entity: a
/// later stage for the same entity replaces the earlier one in place, and
/// commit emits events in first-stage order.
pub struct Txn<'m, T: Instance> {
    model: &'m Model<T>,
    readonly: bool,
    discarded: bool,
    committed: bool,
    ops: Vec<Operation>,
}

impl<'m, T: Instance> Txn<'m, T> {
    pub(crate) fn new(model: &'m Model<T>, readonly: bool) -> Self {
        Self {
            model,
            readonly,
            discarded: false,
            committed: false,
            ops: Vec::new(),
        }
    }

    /// Stage the creation of a new instance.
    ///
    /// A record arriving with the unassigned id is given a fresh one,
    /// written back into `record` before marshalling. Fails with
    /// [`StoreError::AlreadyExists`] if the entity key is live, unless this
    /// transaction has itself staged a delete for the same entity, in which
    /// case the create replaces the staged delete and wins.
    pub fn create(&mut self, record: &mut T) -> Result<(), StoreError> {
        self.ensure_writable()?;

        if record.entity_id().is_unassigned() {
            record.set_entity_id(EntityId::new());
        }
        let entity = record.entity_id().clone();

        let deletes_in_txn = self
            .ops
            .iter()
            .any(|op| op.entity == entity && op.kind == OperationKind::Delete);
        if !deletes_in_txn && self.model.namespace().has(&instance_key(&entity))? {
            return Err(StoreError::AlreadyExists(entity));
        }

        let full = serde_json::to_value(&*record)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.stage(Operation::upsert(entity, full));
        Ok(())
    }

    /// Stage an update of an existing instance.
    ///
    /// Computes an RFC 7396 merge-patch from the stored bytes to the new
    /// record. Because the patch is a delta, a save cannot remove members
    /// the record type does not carry; callers work with the full record.
    pub fn save(&mut self, record: &T) -> Result<(), StoreError> {
        self.ensure_writable()?;

        let entity = record.entity_id().clone();
        let key = instance_key(&entity);
        let current_bytes = self
            .model
            .namespace()
            .get(&key)?
            .ok_or_else(|| StoreError::NotFound(entity.clone()))?;

        let current: Value =
            serde_json::from_slice(&current_bytes).map_err(|e| StoreError::Patch {
                entity: entity.clone(),
                reason: e.to_string(),
            })?;
        let updated = serde_json::to_value(record)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        self.stage(Operation::upsert(entity, diff_values(&current, &updated)));
        Ok(())
    }

    /// Stage the deletion of an instance.
    pub fn delete(&mut self, entity: &EntityId) -> Result<(), StoreError> {
        self.ensure_writable()?;

        if !self.model.namespace().has(&instance_key(entity))? {
            return Err(StoreError::NotFound(entity.clone()));
        }
        self.stage(Operation::delete(entity.clone()));
        Ok(())
    }

    /// Check whether an instance is live in the materialized state.
    pub fn has(&self, entity: &EntityId) -> Result<bool, StoreError> {
        self.ensure_open()?;
        Ok(self.model.namespace().has(&instance_key(entity))?)
    }

    /// Read one instance from the materialized state.
    pub fn find_by_id(&self, entity: &EntityId) -> Result<T, StoreError> {
        self.ensure_open()?;
        let bytes = self
            .model
            .namespace()
            .get(&instance_key(entity))?
            .ok_or_else(|| StoreError::NotFound(entity.clone()))?;
        serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Read every instance matching `predicate`, in key order.
    pub fn find(&self, predicate: impl Fn(&T) -> bool) -> Result<Vec<T>, StoreError> {
        self.ensure_open()?;
        let entries = self.model.namespace().query(&Query::all())?;
        let mut matching = Vec::new();
        for entry in entries {
            let record: T = serde_json::from_slice(&entry.value)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            if predicate(&record) {
                matching.push(record);
            }
        }
        Ok(matching)
    }

    /// Mark the transaction discarded; staged operations are dropped.
    pub fn discard(&mut self) {
        self.discarded = true;
    }

    /// Marshal each staged operation into an event and dispatch it.
    ///
    /// Events share one timestamp and go out in first-stage order. The first
    /// dispatch error propagates immediately with no rollback: the
    /// materialized state then reflects the dispatched prefix, and
    /// [`Model::replay`] is the reconciliation path.
    pub fn commit(&mut self) -> Result<(), StoreError> {
        self.ensure_open()?;
        if self.readonly {
            return Err(StoreError::ReadOnlyTransaction);
        }

        debug!(model = self.model.name(), ops = self.ops.len(), "committing transaction");
        let now = Timestamp::now();
        for op in &self.ops {
            let body =
                serde_json::to_vec(op).map_err(|e| StoreError::Serialization(e.to_string()))?;
            let event = Event::new(
                now,
                op.entity.clone(),
                self.model.schema().clone(),
                body,
            );
            self.model.dispatcher().dispatch(&event)?;
        }
        self.committed = true;
        Ok(())
    }

    /// Number of staged operations.
    pub fn staged(&self) -> usize {
        self.ops.len()
    }

    fn stage(&mut self, op: Operation) {
        match self.ops.iter_mut().find(|staged| staged.entity == op.entity) {
            Some(staged) => *staged = op,
            None => self.ops.push(op),
        }
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.discarded || self.committed {
            return Err(StoreError::TransactionClosed);
        }
        Ok(())
    }

    fn ensure_writable(&self) -> Result<(), StoreError> {
        self.ensure_open()?;
        if self.readonly {
            return Err(StoreError::ReadOnlyTransaction);
        }
        Ok(())
    }
}
