//! Schema-typed models over the Keel event log.
//!
//! This crate is the user-facing surface of Keel. A [`Store`] registers
//! named [`Model`]s whose instances are serde records; every mutation is
//! staged in a [`Txn`], emitted as an event on commit, and applied to the
//! model's materialized key/value namespace by the model's reducer. Reads
//! bypass the dispatcher and consult the materialized state directly.
//!
//! # Key Types
//!
//! - [`Store`] — Facade wiring a datastore and a dispatcher together
//! - [`Model`] — Named, schema-typed collection with its own namespace and lock
//! - [`Txn`] — Scoped buffer of staged operations, committed as events
//! - [`Instance`] — Capability trait record types implement (`entity_id` access)
//! - [`Operation`] — The staged-mutation wire type carried in event bodies
//!
//! # Example
//!
//! ```ignore
//! let store = Store::new(datastore, dispatcher);
//! let people = store.register::<Person>("Person")?;
//!
//! let mut alice = Person { id: EntityId::unassigned(), name: "Alice".into(), age: 42 };
//! people.add(&mut alice)?;
//!
//! people.write(|txn| {
//!     let mut found: Person = txn.find_by_id(&alice.id)?;
//!     found.age += 1;
//!     txn.save(&found)
//! })?;
//! ```

pub mod error;
pub mod instance;
pub mod model;
pub mod operation;
pub mod reducer;
pub mod store;
pub mod txn;

pub use error::StoreError;
pub use instance::Instance;
pub use model::Model;
pub use operation::{Operation, OperationKind};
pub use store::Store;
pub use txn::Txn;
