//! Records as seen by the synchronization core.

use crate::types::{RecordKey, TypeName};
use crate::value::{Attributes, Value};
use serde::{Deserialize, Serialize};

/// A record owned by the external record store.
///
/// The core only reads records: it never mutates attributes and never
/// persists anything on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Type of the record.
    #[serde(rename = "type")]
    pub type_name: TypeName,
    /// Primary key of the record.
    pub key: RecordKey,
    /// Current attribute values.
    #[serde(default)]
    pub attributes: Attributes,
}

impl Record {
    /// Creates a record with no attributes.
    pub fn new(type_name: impl Into<TypeName>, key: impl Into<RecordKey>) -> Self {
        Self {
            type_name: type_name.into(),
            key: key.into(),
            attributes: Attributes::new(),
        }
    }

    /// Sets an attribute, builder style.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Sets an attribute in place, returning the previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.attributes.insert(name.into(), value.into())
    }

    /// Returns the record's type.
    pub fn type_name(&self) -> &TypeName {
        &self.type_name
    }

    /// Returns the record's primary key.
    pub fn key(&self) -> &RecordKey {
        &self.key
    }

    /// Returns all attributes.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Returns an attribute value, if present.
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Returns an attribute as text, if present and textual.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.attribute(name).and_then(Value::as_text)
    }
}
