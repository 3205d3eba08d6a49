use std::sync::Arc;

use crate::error::DatastoreResult;
use crate::key::Key;
use crate::query::{Entry, Query};
use crate::traits::Datastore;

/// Prefix wrapper carving a private namespace out of a shared datastore.
///
/// Every key is translated under the namespace prefix on the way in and
/// stripped on the way out, so a `Namespaced` handle sees only its own keys.
/// Models use one of these over the store's shared datastore.
#[derive(Clone)]
pub struct Namespaced {
    inner: Arc<dyn Datastore>,
    prefix: Key,
}

impl Namespaced {
    /// Wrap `inner`, scoping all access under `prefix`.
    pub fn new(inner: Arc<dyn Datastore>, prefix: Key) -> Self {
        Self { inner, prefix }
    }

    /// The namespace prefix.
    pub fn prefix(&self) -> &Key {
        &self.prefix
    }

    fn qualify(&self, key: &Key) -> Key {
        if self.prefix.is_root() {
            key.clone()
        } else {
            Key::new(&format!("{}{}", self.prefix, key))
        }
    }
}

impl Datastore for Namespaced {
    fn get(&self, key: &Key) -> DatastoreResult<Option<Vec<u8>>> {
        self.inner.get(&self.qualify(key))
    }

    fn put(&self, key: &Key, value: Vec<u8>) -> DatastoreResult<()> {
        self.inner.put(&self.qualify(key), value)
    }

    fn delete(&self, key: &Key) -> DatastoreResult<bool> {
        self.inner.delete(&self.qualify(key))
    }

    fn has(&self, key: &Key) -> DatastoreResult<bool> {
        self.inner.has(&self.qualify(key))
    }

    fn query(&self, query: &Query) -> DatastoreResult<Vec<Entry>> {
        let qualified_prefix = match &query.prefix {
            Some(prefix) => self.qualify(prefix),
            None => self.prefix.clone(),
        };
        let inner_query = Query {
            prefix: Some(qualified_prefix),
            limit: query.limit,
        };
        let entries = self.inner.query(&inner_query)?;
        Ok(entries
            .into_iter()
            .filter_map(|entry| {
                let key = entry.key.strip_prefix(&self.prefix)?;
                Some(Entry {
                    key,
                    value: entry.value,
                })
            })
            .collect())
    }
}

impl std::fmt::Debug for Namespaced {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Namespaced")
            .field("prefix", &self.prefix)
            .finish()
    }
}
