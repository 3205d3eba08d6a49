use crate::error::DatastoreResult;
use crate::key::Key;
use crate::query::{Entry, Query};

/// Byte-keyed ordered key/value store.
///
/// All implementations must satisfy these invariants:
/// - Keys are hierarchical paths; the store imposes no structure on values.
/// - [`query`](Datastore::query) returns entries in ascending key order.
/// - `delete` of an absent key is not an error; it reports `false`.
/// - All I/O errors are propagated, never silently ignored.
pub trait Datastore: Send + Sync {
    /// Read the value at `key`. Returns `Ok(None)` if the key is absent.
    fn get(&self, key: &Key) -> DatastoreResult<Option<Vec<u8>>>;

    /// Write `value` at `key`, replacing any existing value.
    fn put(&self, key: &Key, value: Vec<u8>) -> DatastoreResult<()>;

    /// Remove the value at `key`. Returns `true` if the key existed.
    fn delete(&self, key: &Key) -> DatastoreResult<bool>;

    /// Check whether `key` is present.
    fn has(&self, key: &Key) -> DatastoreResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Return the entries matching `query`, in ascending key order.
    fn query(&self, query: &Query) -> DatastoreResult<Vec<Entry>>;
}
