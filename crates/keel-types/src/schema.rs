use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Stable string discriminator identifying a model's record schema.
///
/// The reference travels on every event and is what a reducer checks to
/// decide whether an event concerns its model. References are derived from
/// the model name at registration and never change for the life of the
/// process.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaRef(String);

impl SchemaRef {
    /// Build a schema reference from a model name.
    pub fn from_name(name: &str) -> Self {
        Self(format!("schema:{name}"))
    }

    /// Parse a reference from its wire form, `schema:<name>`.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        match s.strip_prefix("schema:") {
            Some(name) if !name.is_empty() => Ok(Self(s.to_string())),
            _ => Err(TypeError::InvalidSchemaRef(s.to_string())),
        }
    }

    /// The reference as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SchemaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SchemaRef({})", self.0)
    }
}

impl fmt::Display for SchemaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
