//! Foundation types for Keel.
//!
//! This crate provides the identity and temporal types used throughout the
//! Keel system. Every other Keel crate depends on `keel-types`.
//!
//! # Key Types
//!
//! - [`EntityId`] — Opaque string identifier for an instance within a model
//! - [`SchemaRef`] — Stable string discriminator for a model's record schema
//! - [`Timestamp`] — Nanoseconds since the UNIX epoch, totally ordered
//! - [`TypeError`] — Parse and validation failures for the above

pub mod entity;
pub mod error;
pub mod schema;
pub mod temporal;

pub use entity::EntityId;
pub use error::TypeError;
pub use schema::SchemaRef;
pub use temporal::Timestamp;
