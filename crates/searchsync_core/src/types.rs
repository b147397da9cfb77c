//! Core type definitions for SearchSync.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Name of a record type (the unit blueprints are declared on).
///
/// Type names are stable and compared exactly; `Person` and `person`
/// are different types.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeName(String);

impl TypeName {
    /// Creates a new type name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TypeName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl Borrow<str> for TypeName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Canonical string form of a record's primary key.
///
/// Integer keys are rendered in decimal, so `RecordKey::from(1)` and
/// `RecordKey::from("1")` are the same key. Keys serialize as strings and
/// deserialize from either strings or integers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RecordKey(String);

impl<'de> Deserialize<'de> for RecordKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeyVisitor;

        impl Visitor<'_> for KeyVisitor {
            type Value = RecordKey;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string or integer record key")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<RecordKey, E> {
                Ok(RecordKey::new(v))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<RecordKey, E> {
                Ok(RecordKey(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<RecordKey, E> {
                Ok(RecordKey::from(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<RecordKey, E> {
                Ok(RecordKey::from(v))
            }
        }

        deserializer.deserialize_any(KeyVisitor)
    }
}

impl RecordKey {
    /// Creates a key from its canonical string form.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for RecordKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<i64> for RecordKey {
    fn from(key: i64) -> Self {
        Self(key.to_string())
    }
}

impl From<u64> for RecordKey {
    fn from(key: u64) -> Self {
        Self(key.to_string())
    }
}

impl From<i32> for RecordKey {
    fn from(key: i32) -> Self {
        Self(key.to_string())
    }
}

/// Encoded document identity, as handed to the indexing engine.
///
/// Produced by an [`IdentityCodec`](crate::IdentityCodec); the engine
/// treats it as an opaque key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Wraps an already encoded identity.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the encoded identity.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
