//! Indexing engine collaborator.

use crate::changes::ChangeSet;
use crate::error::SyncResult;
use crate::record::Record;
use crate::types::{DocumentId, TypeName};

/// Write and query access to the text-indexing engine.
///
/// Implementations own tokenization, storage and ranking. The synchronizer
/// only tells them which document to write or drop.
///
/// # Invariants
///
/// - `upsert` is idempotent per document id (last write wins)
/// - `remove` of an absent document is a no-op, not an error
/// - Implementations must be `Send + Sync`; the synchronizer may be shared
///   across threads
pub trait IndexingEngine: Send + Sync {
    /// Adds or replaces the document for `record`.
    ///
    /// `changes` is contextual metadata: the attributes whose change
    /// triggered the write. Engines may use it to recompute only the
    /// affected fields.
    ///
    /// # Errors
    ///
    /// Returns `EngineUnavailable` or `EngineWriteFailed`.
    fn upsert(&self, document: &DocumentId, record: &Record, changes: &ChangeSet) -> SyncResult<()>;

    /// Removes a document.
    ///
    /// # Errors
    ///
    /// Returns `EngineUnavailable` or `EngineWriteFailed`.
    fn remove(&self, document: &DocumentId) -> SyncResult<()>;

    /// Runs a query restricted to documents of one type.
    ///
    /// # Errors
    ///
    /// Returns `EngineUnavailable` if the engine cannot be queried.
    fn search(&self, type_name: &TypeName, query: &str) -> SyncResult<Vec<DocumentId>>;
}
