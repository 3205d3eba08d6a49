//! Event dispatch for Keel.
//!
//! The dispatcher is the serializing hub of the system: every mutation
//! reaches it as an [`Event`], is persisted to the event log, and is then
//! delivered synchronously to every registered [`Reducer`] under one global
//! lock. The persisted log is the single source of truth; materialized model
//! state is always reconstructible from it.
//!
//! # Key Types
//!
//! - [`Event`] — Immutable record of one mutation
//! - [`Dispatcher`] — Persist-then-deliver hub with registration tokens
//! - [`Reducer`] — Trait implemented by event consumers
//! - [`EventFilter`] — Predicate for querying the persisted log
//! - [`EventStoreHandle`] — Read-only view of the event log

pub mod dispatcher;
pub mod error;
pub mod event;
pub mod reducer;

pub use dispatcher::{Dispatcher, EventFilter, EventStoreHandle};
pub use error::DispatchError;
pub use event::Event;
pub use reducer::{Reducer, Token};
