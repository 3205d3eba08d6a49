use std::marker::PhantomData;
use std::sync::{Arc, Mutex};

use tracing::debug;

use keel_datastore::{Datastore, Key, Namespaced, Query};
use keel_dispatch::{Dispatcher, EventFilter, Reducer, Token};
use keel_types::{EntityId, SchemaRef};

use crate::error::StoreError;
use crate::instance::Instance;
use crate::reducer::ModelReducer;
use crate::txn::Txn;

/// A named, schema-typed collection of instances.
///
/// A model owns a private key namespace within the store's datastore, a
/// schema reference that routes events to its reducer, and one exclusive
/// lock. The lock is held for the entire duration of any transaction,
/// including commit: reads and writes are mutually exclusive, which keeps
/// the save path's read-then-dispatch step free of interleaving writers and
/// gives the reducer a serialized stream of this model's events.
///
/// Dropping the model releases its dispatcher registration.
pub struct Model<T: Instance> {
    name: String,
    schema: SchemaRef,
    namespace: Namespaced,
    dispatcher: Arc<Dispatcher>,
    reducer: Arc<ModelReducer>,
    token: Token,
    lock: Mutex<()>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Instance> Model<T> {
    pub(crate) fn register(
        name: &str,
        datastore: Arc<dyn Datastore>,
        dispatcher: Arc<Dispatcher>,
    ) -> Result<Self, StoreError> {
        let schema = SchemaRef::from_name(name);
        let namespace = Namespaced::new(datastore, Key::new(name));
        let reducer = Arc::new(ModelReducer::new(schema.clone(), namespace.clone()));
        let token = dispatcher.register(reducer.clone() as Arc<dyn Reducer>)?;

        Ok(Self {
            name: name.to_string(),
            schema,
            namespace,
            dispatcher,
            reducer,
            token,
            lock: Mutex::new(()),
            _record: PhantomData,
        })
    }

    /// The model's registered name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The schema reference carried by this model's events.
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// Run `f` inside a read-only transaction.
    ///
    /// The model lock is held until `f` returns; the transaction is
    /// discarded afterwards and no events are produced. `f`'s error
    /// propagates unchanged.
    pub fn read<R>(
        &self,
        f: impl FnOnce(&mut Txn<'_, T>) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let _guard = self.lock.lock().expect("model lock poisoned");
        let mut txn = Txn::new(self, true);
        let result = f(&mut txn);
        txn.discard();
        result
    }

    /// Run `f` inside a writable transaction.
    ///
    /// On `Ok` the transaction commits, dispatching one event per staged
    /// operation; on `Err` it is discarded and the error propagates
    /// unchanged. The model lock is held throughout, commit included.
    pub fn write<R>(
        &self,
        f: impl FnOnce(&mut Txn<'_, T>) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let _guard = self.lock.lock().expect("model lock poisoned");
        let mut txn = Txn::new(self, false);
        match f(&mut txn) {
            Ok(value) => {
                txn.commit()?;
                Ok(value)
            }
            Err(err) => {
                txn.discard();
                Err(err)
            }
        }
    }

    /// Create one instance in an implicit write transaction.
    pub fn add(&self, record: &mut T) -> Result<(), StoreError> {
        self.write(|txn| txn.create(record))
    }

    /// Update one instance in an implicit write transaction.
    pub fn save(&self, record: &T) -> Result<(), StoreError> {
        self.write(|txn| txn.save(record))
    }

    /// Delete one instance in an implicit write transaction.
    pub fn delete(&self, entity: &EntityId) -> Result<(), StoreError> {
        self.write(|txn| txn.delete(entity))
    }

    /// Check for one instance in an implicit read transaction.
    pub fn has(&self, entity: &EntityId) -> Result<bool, StoreError> {
        self.read(|txn| txn.has(entity))
    }

    /// Read one instance in an implicit read transaction.
    pub fn find_by_id(&self, entity: &EntityId) -> Result<T, StoreError> {
        self.read(|txn| txn.find_by_id(entity))
    }

    /// Read all instances matching `predicate` in an implicit read
    /// transaction.
    pub fn find(&self, predicate: impl Fn(&T) -> bool) -> Result<Vec<T>, StoreError> {
        self.read(|txn| txn.find(&predicate))
    }

    /// Rebuild the materialized namespace from the event log.
    ///
    /// Clears every key in the namespace, then re-applies this model's
    /// events in insertion order. This is the reconciliation path after a
    /// partially failed commit left the materialized state ahead of the
    /// caller's view. Returns the number of events applied.
    pub fn replay(&self) -> Result<usize, StoreError> {
        let _guard = self.lock.lock().expect("model lock poisoned");

        for entry in self.namespace.query(&Query::all())? {
            self.namespace.delete(&entry.key)?;
        }

        let filter = EventFilter {
            schema: Some(self.schema.clone()),
            ..Default::default()
        };
        let events = self.dispatcher.query(&filter)?;
        for event in &events {
            self.reducer.reduce(event)?;
        }

        debug!(model = %self.name, events = events.len(), "namespace rebuilt from log");
        Ok(events.len())
    }

    pub(crate) fn namespace(&self) -> &Namespaced {
        &self.namespace
    }

    pub(crate) fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

impl<T: Instance> Drop for Model<T> {
    fn drop(&mut self) {
        // Teardown must not fail; the dispatcher may already be shutting down.
        let _ = self.dispatcher.deregister(&self.token);
    }
}

impl<T: Instance> std::fmt::Debug for Model<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .field("token", &self.token)
            .finish()
    }
}
