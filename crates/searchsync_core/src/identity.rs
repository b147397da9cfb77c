//! Document identity encoding.
//!
//! A document identity is the string key the indexing engine stores a
//! document under. It is derived deterministically from a record's
//! `(type name, primary key)` pair and must decode back to that pair:
//!
//! ```text
//! decode(encode(t, k)) == (t, k)
//! ```
//!
//! Two codecs are provided:
//!
//! - [`SeparatorCodec`]: `Person-1`. Splits on the first separator, so type
//!   names may not contain the separator but keys may.
//! - [`LengthPrefixedCodec`]: `6:Person1`. No character restrictions.

use crate::error::{SyncError, SyncResult};
use crate::types::{DocumentId, RecordKey, TypeName};
use std::fmt;

/// Separator used by [`SeparatorCodec::default`].
pub const DEFAULT_SEPARATOR: char = '-';

/// A decoded document identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentIdentity {
    /// Type of the record the document belongs to.
    pub type_name: TypeName,
    /// Primary key of the record.
    pub key: RecordKey,
}

impl DocumentIdentity {
    /// Creates a new identity pair.
    pub fn new(type_name: impl Into<TypeName>, key: impl Into<RecordKey>) -> Self {
        Self {
            type_name: type_name.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for DocumentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.type_name, self.key)
    }
}

/// Encodes and decodes document identities.
///
/// Implementations must be pure and deterministic.
pub trait IdentityCodec: Send + Sync {
    /// Encodes a `(type, key)` pair.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTypeName` if the type name cannot be represented
    /// unambiguously by this codec.
    fn encode(&self, type_name: &TypeName, key: &RecordKey) -> SyncResult<DocumentId>;

    /// Decodes an identity string back into its `(type, key)` pair.
    ///
    /// # Errors
    ///
    /// Returns `MalformedIdentity` if the string was not produced by
    /// this codec.
    fn decode(&self, identity: &str) -> SyncResult<DocumentIdentity>;
}

/// Encodes identities as `{type}{separator}{key}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeparatorCodec {
    separator: char,
}

impl SeparatorCodec {
    /// Creates a codec with a custom separator.
    #[must_use]
    pub const fn new(separator: char) -> Self {
        Self { separator }
    }

    /// Returns the separator character.
    #[must_use]
    pub const fn separator(&self) -> char {
        self.separator
    }
}

impl Default for SeparatorCodec {
    fn default() -> Self {
        Self::new(DEFAULT_SEPARATOR)
    }
}

impl IdentityCodec for SeparatorCodec {
    fn encode(&self, type_name: &TypeName, key: &RecordKey) -> SyncResult<DocumentId> {
        let name = type_name.as_str();
        if name.is_empty() {
            return Err(SyncError::invalid_type_name(name, "type name is empty"));
        }
        if name.contains(self.separator) {
            return Err(SyncError::invalid_type_name(
                name,
                format!("type name contains the separator {:?}", self.separator),
            ));
        }
        Ok(DocumentId::new(format!("{name}{}{key}", self.separator)))
    }

    fn decode(&self, identity: &str) -> SyncResult<DocumentIdentity> {
        let Some((name, key)) = identity.split_once(self.separator) else {
            return Err(SyncError::malformed_identity(
                identity,
                format!("missing separator {:?}", self.separator),
            ));
        };
        if name.is_empty() {
            return Err(SyncError::malformed_identity(identity, "empty type name"));
        }
        Ok(DocumentIdentity::new(name, key))
    }
}

/// Encodes identities as `{len(type)}:{type}{key}`.
///
/// The byte length header removes every restriction on the characters of
/// type names and keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LengthPrefixedCodec;

impl IdentityCodec for LengthPrefixedCodec {
    fn encode(&self, type_name: &TypeName, key: &RecordKey) -> SyncResult<DocumentId> {
        let name = type_name.as_str();
        if name.is_empty() {
            return Err(SyncError::invalid_type_name(name, "type name is empty"));
        }
        Ok(DocumentId::new(format!("{}:{name}{key}", name.len())))
    }

    fn decode(&self, identity: &str) -> SyncResult<DocumentIdentity> {
        let Some((header, rest)) = identity.split_once(':') else {
            return Err(SyncError::malformed_identity(identity, "missing length header"));
        };
        // Only the canonical decimal form `encode` writes: no sign, no leading zero.
        if header.is_empty() || !header.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SyncError::malformed_identity(identity, "length header is not a number"));
        }
        if header.starts_with('0') {
            return Err(SyncError::malformed_identity(
                identity,
                "length header is zero or zero-padded",
            ));
        }
        let len: usize = header
            .parse()
            .map_err(|_| SyncError::malformed_identity(identity, "length header is out of range"))?;
        if len > rest.len() || !rest.is_char_boundary(len) {
            return Err(SyncError::malformed_identity(
                identity,
                format!("length header {len} exceeds the encoded type name"),
            ));
        }
        let (name, key) = rest.split_at(len);
        Ok(DocumentIdentity::new(name, key))
    }
}
