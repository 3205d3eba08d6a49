use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Opaque identifier for an instance within a model.
///
/// An `EntityId` is a non-empty string. The empty string is reserved as the
/// *unassigned* sentinel: a record created with an unassigned id receives a
/// freshly generated one (UUID v7, so generated ids are time-ordered).
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Generate a fresh, globally unique entity id.
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    /// The unassigned sentinel (empty string).
    pub fn unassigned() -> Self {
        Self(String::new())
    }

    /// Returns `true` if this id is the unassigned sentinel.
    pub fn is_unassigned(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse an assigned entity id from external input.
    ///
    /// Rejects the empty string, which is reserved as the unassigned
    /// sentinel; use [`EntityId::unassigned`] for that.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        if s.is_empty() {
            return Err(TypeError::EmptyEntityId);
        }
        Ok(Self(s.to_string()))
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unassigned() {
            write!(f, "EntityId(unassigned)")
        } else {
            write!(f, "EntityId({})", self.0)
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
