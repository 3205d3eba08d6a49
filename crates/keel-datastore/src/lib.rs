//! Ordered key/value storage for Keel.
//!
//! This crate defines the thin contract the rest of the system stores bytes
//! through, plus the in-memory backends required by callers:
//!
//! - [`Datastore`] — the byte-keyed ordered KV trait (`get`, `put`,
//!   `delete`, `has`, `query`)
//! - [`MemDatastore`] — `BTreeMap`-based store for materialized model state
//! - [`TxnDatastore`] — store with an atomic [`Batch`] write path, used for
//!   the dispatcher's event log
//! - [`Namespaced`] — prefix wrapper carving a private key namespace out of
//!   a shared store
//!
//! Keys are hierarchical paths ([`Key`], e.g. `/Person/p1`) and the stores
//! are ordered: [`Datastore::query`] returns entries in ascending key order.

pub mod error;
pub mod key;
pub mod memory;
pub mod namespace;
pub mod query;
pub mod traits;
pub mod txn;

pub use error::{DatastoreError, DatastoreResult};
pub use key::Key;
pub use memory::MemDatastore;
pub use namespace::Namespaced;
pub use query::{Entry, Query};
pub use traits::Datastore;
pub use txn::{Batch, TxnDatastore};
