//! # SearchSync Core
//!
//! Keeps a full-text search index consistent with a mutable record store.
//!
//! This crate provides:
//! - Document identity encoding ([`IdentityCodec`])
//! - Change tracking ([`changed_attributes`])
//! - Per-type indexing policy ([`Blueprint`], [`decide`])
//! - One-hop dependency cascades ([`DependencyRule`])
//! - Full rebuilds of a type ([`Synchronizer::rebuild`])
//! - An optional background worker ([`BackgroundIndexer`])
//!
//! The record store and the indexing engine are external collaborators,
//! reached through the [`RecordStore`] and [`IndexingEngine`] traits.
//!
//! ## Example
//!
//! ```rust
//! use searchsync_core::{
//!     Blueprint, BlueprintRegistry, MemoryRecordStore, Record, SyncConfig, Synchronizer,
//! };
//! # use searchsync_core::{ChangeSet, DocumentId, IndexingEngine, SyncResult, TypeName};
//! # struct NullEngine;
//! # impl IndexingEngine for NullEngine {
//! #     fn upsert(&self, _: &DocumentId, _: &Record, _: &ChangeSet) -> SyncResult<()> { Ok(()) }
//! #     fn remove(&self, _: &DocumentId) -> SyncResult<()> { Ok(()) }
//! #     fn search(&self, _: &TypeName, _: &str) -> SyncResult<Vec<DocumentId>> { Ok(vec![]) }
//! # }
//! use std::sync::Arc;
//!
//! let blueprints = BlueprintRegistry::new()
//!     .with("Person", Blueprint::new().exclude_when(|r| r.attribute("deleted_at").is_some()));
//! let store = Arc::new(MemoryRecordStore::new());
//! let sync = Synchronizer::new(SyncConfig::default(), blueprints, store.clone(), Arc::new(NullEngine));
//!
//! let person = Record::new("Person", 1i64).with("name", "Kogler");
//! let outcome = sync.on_create_or_update(&person).unwrap().unwrap();
//! assert_eq!(outcome.document.as_str(), "Person-1");
//! store.put(person);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod blueprint;
mod changes;
mod config;
mod decision;
pub mod deps;
mod dispatch;
mod engine;
mod error;
mod identity;
mod rebuild;
mod record;
mod store;
mod sync;
mod types;
mod value;

#[cfg(test)]
mod test_support;

pub use blueprint::{
    Blueprint, BlueprintRegistry, DependencyResolver, DependencyRule, ExclusionPredicate,
};
pub use changes::{changed_attributes, ChangeSet};
pub use config::{IdentityScheme, MissingRecordPolicy, SyncConfig};
pub use decision::{decide, Decision, SkipReason, Trigger};
pub use dispatch::{BackgroundIndexer, DispatchStats, IndexJob, JobFailure};
pub use engine::IndexingEngine;
pub use error::{BoxError, SyncError, SyncResult};
pub use identity::{
    DocumentIdentity, IdentityCodec, LengthPrefixedCodec, SeparatorCodec, DEFAULT_SEPARATOR,
};
pub use rebuild::RebuildReport;
pub use record::Record;
pub use store::{MemoryRecordStore, RecordIter, RecordStore, DEFAULT_PAGE_SIZE};
pub use sync::{Hooks, SyncOutcome, Synchronizer};
pub use types::{DocumentId, RecordKey, TypeName};
pub use value::{Attributes, Value};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
