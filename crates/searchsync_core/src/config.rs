//! Synchronizer configuration.

use crate::identity::{IdentityCodec, LengthPrefixedCodec, SeparatorCodec, DEFAULT_SEPARATOR};
use std::sync::Arc;

/// How document identities are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityScheme {
    /// `{type}{separator}{key}`, e.g. `Person-1`.
    Separator(char),
    /// `{len(type)}:{type}{key}`, e.g. `6:Person1`.
    LengthPrefixed,
}

impl Default for IdentityScheme {
    fn default() -> Self {
        IdentityScheme::Separator(DEFAULT_SEPARATOR)
    }
}

/// What a rebuild does when a listed record disappears before it is read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingRecordPolicy {
    /// Log the record's identity, count it, and continue.
    #[default]
    Skip,
    /// Stop the rebuild and return the error.
    Abort,
}

/// Configuration for a [`Synchronizer`](crate::Synchronizer).
#[derive(Debug, Clone, Default)]
pub struct SyncConfig {
    /// Document identity encoding.
    pub identity: IdentityScheme,

    /// Rebuild behavior for records deleted mid-enumeration.
    pub missing_records: MissingRecordPolicy,
}

impl SyncConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the identity encoding.
    #[must_use]
    pub const fn with_identity(mut self, scheme: IdentityScheme) -> Self {
        self.identity = scheme;
        self
    }

    /// Sets the rebuild policy for missing records.
    #[must_use]
    pub const fn with_missing_records(mut self, policy: MissingRecordPolicy) -> Self {
        self.missing_records = policy;
        self
    }

    /// Builds the identity codec selected by this configuration.
    pub fn codec(&self) -> Arc<dyn IdentityCodec> {
        match self.identity {
            IdentityScheme::Separator(sep) => Arc::new(SeparatorCodec::new(sep)),
            IdentityScheme::LengthPrefixed => Arc::new(LengthPrefixedCodec),
        }
    }
}
