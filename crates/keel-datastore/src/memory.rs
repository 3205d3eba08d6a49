use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::{DatastoreError, DatastoreResult};
use crate::key::Key;
use crate::query::{Entry, Query};
use crate::traits::Datastore;

/// In-memory, `BTreeMap`-based datastore.
///
/// Holds materialized model state for tests and embedding. The map is kept
/// behind an `RwLock` for safe concurrent access; the `BTreeMap` gives the
/// ordered iteration the [`Datastore`] contract requires.
pub struct MemDatastore {
    entries: RwLock<BTreeMap<Key, Vec<u8>>>,
}

impl MemDatastore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.entries.read().map(|m| m.len()).unwrap_or(0)
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove all entries.
    pub fn clear(&self) -> DatastoreResult<()> {
        self.entries
            .write()
            .map_err(|_| DatastoreError::LockPoisoned)?
            .clear();
        Ok(())
    }
}

impl Default for MemDatastore {
    fn default() -> Self {
        Self::new()
    }
}

impl Datastore for MemDatastore {
    fn get(&self, key: &Key) -> DatastoreResult<Option<Vec<u8>>> {
        let map = self
            .entries
            .read()
            .map_err(|_| DatastoreError::LockPoisoned)?;
        Ok(map.get(key).cloned())
    }

    fn put(&self, key: &Key, value: Vec<u8>) -> DatastoreResult<()> {
        let mut map = self
            .entries
            .write()
            .map_err(|_| DatastoreError::LockPoisoned)?;
        map.insert(key.clone(), value);
        Ok(())
    }

    fn delete(&self, key: &Key) -> DatastoreResult<bool> {
        let mut map = self
            .entries
            .write()
            .map_err(|_| DatastoreError::LockPoisoned)?;
        Ok(map.remove(key).is_some())
    }

    fn has(&self, key: &Key) -> DatastoreResult<bool> {
        let map = self
            .entries
            .read()
            .map_err(|_| DatastoreError::LockPoisoned)?;
        Ok(map.contains_key(key))
    }

    fn query(&self, query: &Query) -> DatastoreResult<Vec<Entry>> {
        let map = self
            .entries
            .read()
            .map_err(|_| DatastoreError::LockPoisoned)?;
        let matching = map
            .iter()
            .filter(|(key, _)| query.matches(key))
            .take(query.limit.unwrap_or(usize::MAX))
            .map(|(key, value)| Entry {
                key: key.clone(),
                value: value.clone(),
            })
            .collect();
        Ok(matching)
    }
}

impl std::fmt::Debug for MemDatastore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemDatastore")
            .field("entry_count", &self.len())
            .finish()
    }
}
