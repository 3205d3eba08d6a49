use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::{DatastoreError, DatastoreResult};
use crate::key::Key;
use crate::query::{Entry, Query};
use crate::traits::Datastore;

/// In-memory datastore with an atomic batch write path.
///
/// Direct reads and writes behave like [`crate::MemDatastore`]. In addition,
/// [`transaction`](TxnDatastore::transaction) returns a [`Batch`] that
/// buffers puts and deletes and applies them under a single write-lock
/// acquisition, so either every buffered write lands or none does. The
/// dispatcher uses this for event persistence.
pub struct TxnDatastore {
    entries: RwLock<BTreeMap<Key, Vec<u8>>>,
}

impl TxnDatastore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// Begin a write batch against this store.
    pub fn transaction(&self) -> Batch<'_> {
        Batch {
            store: self,
            writes: Vec::new(),
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
}

impl Default for TxnDatastore {
    fn default() -> Self {
        Self::new()
    }
}

impl Datastore for TxnDatastore {
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

impl std::fmt::Debug for TxnDatastore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TxnDatastore")
            .field("entry_count", &self.len())
            .finish()
    }
}

enum Write {
    Put(Key, Vec<u8>),
    Delete(Key),
}

/// A buffered write batch against a [`TxnDatastore`].
///
/// Writes are invisible to readers until [`commit`](Batch::commit). A
/// dropped batch applies nothing.
pub struct Batch<'s> {
    store: &'s TxnDatastore,
    writes: Vec<Write>,
}

impl Batch<'_> {
    /// Buffer a put.
    pub fn put(&mut self, key: Key, value: Vec<u8>) {
        self.writes.push(Write::Put(key, value));
    }

    /// Buffer a delete.
    pub fn delete(&mut self, key: Key) {
        self.writes.push(Write::Delete(key));
    }

    /// Number of buffered writes.
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Returns `true` if nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Apply every buffered write atomically, in buffer order.
    pub fn commit(self) -> DatastoreResult<()> {
        let mut map = self
            .store
            .entries
            .write()
            .map_err(|_| DatastoreError::LockPoisoned)?;
        for write in self.writes {
            match write {
                Write::Put(key, value) => {
                    map.insert(key, value);
                }
                Write::Delete(key) => {
                    map.remove(&key);
                }
            }
        }
        Ok(())
    }
}
