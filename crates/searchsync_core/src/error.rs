//! Error types for SearchSync core.

use thiserror::Error;

/// Result type for synchronization operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Boxed error returned by user-supplied dependency resolvers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while keeping the index in sync.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A document identity string could not be decoded.
    #[error("malformed document identity {identity:?}: {reason}")]
    MalformedIdentity {
        /// The offending identity string.
        identity: String,
        /// Why decoding failed.
        reason: String,
    },

    /// A type name is not legal for the configured identity codec.
    #[error("invalid type name {type_name:?}: {reason}")]
    InvalidTypeName {
        /// The rejected type name.
        type_name: String,
        /// Why the name was rejected.
        reason: String,
    },

    /// No blueprint is registered for the type.
    #[error("no blueprint registered for type {type_name}")]
    UnknownType {
        /// The unregistered type name.
        type_name: String,
    },

    /// The indexing engine could not be reached.
    #[error("indexing engine unavailable: {message}")]
    EngineUnavailable {
        /// Description of the failure.
        message: String,
    },

    /// The indexing engine rejected or failed a write.
    #[error("indexing engine failed to write {document}: {message}")]
    EngineWriteFailed {
        /// Identity of the document being written.
        document: String,
        /// Description of the failure.
        message: String,
    },

    /// A dependency rule's resolver returned an error.
    #[error("dependency rule #{rule} of type {type_name} failed: {source}")]
    ResolverFailure {
        /// Type the rule is declared on.
        type_name: String,
        /// Position of the rule in declaration order.
        rule: usize,
        /// The resolver's error.
        #[source]
        source: BoxError,
    },

    /// A record vanished while it was being read.
    #[error("record not found: {type_name} {key}")]
    RecordNotFound {
        /// Type of the missing record.
        type_name: String,
        /// Primary key of the missing record.
        key: String,
    },

    /// The record store failed.
    #[error("record store error: {message}")]
    Store {
        /// Description of the failure.
        message: String,
    },

    /// The background indexing queue is no longer accepting jobs.
    #[error("indexing queue is closed")]
    QueueClosed,
}

impl SyncError {
    /// Creates a malformed identity error.
    pub fn malformed_identity(identity: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedIdentity {
            identity: identity.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid type name error.
    pub fn invalid_type_name(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTypeName {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    /// Creates an unknown type error.
    pub fn unknown_type(type_name: impl Into<String>) -> Self {
        Self::UnknownType {
            type_name: type_name.into(),
        }
    }

    /// Creates an engine unavailable error.
    pub fn engine_unavailable(message: impl Into<String>) -> Self {
        Self::EngineUnavailable {
            message: message.into(),
        }
    }

    /// Creates an engine write failure.
    pub fn engine_write_failed(document: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EngineWriteFailed {
            document: document.into(),
            message: message.into(),
        }
    }

    /// Creates a record not found error.
    pub fn record_not_found(type_name: impl Into<String>, key: impl Into<String>) -> Self {
        Self::RecordNotFound {
            type_name: type_name.into(),
            key: key.into(),
        }
    }

    /// Creates a record store error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Returns true if the error came from the indexing engine.
    ///
    /// Commit pipelines use this to decide whether to roll back the
    /// triggering transaction.
    pub fn is_engine_error(&self) -> bool {
        matches!(
            self,
            Self::EngineUnavailable { .. } | Self::EngineWriteFailed { .. }
        )
    }
}
