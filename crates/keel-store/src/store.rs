use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use tracing::info;

use keel_datastore::Datastore;
use keel_dispatch::Dispatcher;

use crate::error::StoreError;
use crate::instance::Instance;
use crate::model::Model;

/// Facade wiring a datastore and a dispatcher into a set of named models.
///
/// Each registered model gets a dedicated namespace (keys prefixed with its
/// name) inside the shared datastore and a reducer registration with the
/// dispatcher. The dispatcher is passed in explicitly; it is the process's
/// event hub and is never ambient state.
pub struct Store {
    datastore: Arc<dyn Datastore>,
    dispatcher: Arc<Dispatcher>,
    registered: Mutex<BTreeSet<String>>,
}

impl Store {
    /// Create a store over the given datastore and dispatcher.
    pub fn new(datastore: Arc<dyn Datastore>, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            datastore,
            dispatcher,
            registered: Mutex::new(BTreeSet::new()),
        }
    }

    /// Register a model named `name` for the record type `T`.
    ///
    /// Builds the schema reference from the name, carves out the model's
    /// namespace, and wires the model's reducer into the dispatcher.
    /// Duplicate names are rejected.
    pub fn register<T: Instance>(&self, name: &str) -> Result<Arc<Model<T>>, StoreError> {
        if name.is_empty() || name.contains('/') {
            return Err(StoreError::InvalidModelName(name.to_string()));
        }

        let mut registered = self.registered.lock().expect("model registry lock poisoned");
        if registered.contains(name) {
            return Err(StoreError::DuplicateModel(name.to_string()));
        }

        let model = Model::register(
            name,
            Arc::clone(&self.datastore),
            Arc::clone(&self.dispatcher),
        )?;
        registered.insert(name.to_string());

        info!(model = name, schema = %model.schema(), "model registered");
        Ok(Arc::new(model))
    }

    /// The names of every registered model, sorted.
    pub fn models(&self) -> Vec<String> {
        self.registered
            .lock()
            .expect("model registry lock poisoned")
            .iter()
            .cloned()
            .collect()
    }

    /// The shared event dispatcher.
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// The shared datastore backing every model namespace.
    pub fn datastore(&self) -> &Arc<dyn Datastore> {
        &self.datastore
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("models", &self.models())
            .finish()
    }
}
