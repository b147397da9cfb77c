//! Cross-crate integration test helpers.
//!
//! [`SyncHarness`] plays the record store's commit pipeline: every save runs
//! the create/update hook before the new state is persisted, and a hook
//! error aborts the save.

use crate::fixtures::RecordingEngine;
use searchsync_core::{
    BlueprintRegistry, DocumentId, IndexingEngine, MemoryRecordStore, RebuildReport, Record,
    SyncConfig, SyncOutcome, SyncResult, Synchronizer, TypeName,
};
use searchsync_fts::FtsEngine;
use std::sync::Arc;

/// A store, an engine, and the synchronizer between them.
pub struct SyncHarness<E> {
    /// The record store.
    pub store: Arc<MemoryRecordStore>,
    /// The indexing engine.
    pub engine: Arc<E>,
    /// The synchronizer.
    pub sync: Arc<Synchronizer>,
}

impl<E: IndexingEngine + 'static> SyncHarness<E> {
    /// Creates a harness.
    ///
    /// `blueprints` receives the store so dependency resolvers can query it.
    pub fn with_engine<F>(config: SyncConfig, engine: E, blueprints: F) -> Self
    where
        F: FnOnce(&Arc<MemoryRecordStore>) -> BlueprintRegistry,
    {
        let store = Arc::new(MemoryRecordStore::new());
        let engine = Arc::new(engine);
        let registry = blueprints(&store);
        let sync = Synchronizer::new(config, registry, store.clone(), engine.clone());
        Self {
            store,
            engine,
            sync: Arc::new(sync),
        }
    }

    /// Persists a record without running any hook.
    pub fn seed(&self, record: Record) {
        self.store.put(record);
    }

    /// Runs the create/update hook, then persists the record.
    ///
    /// # Errors
    ///
    /// Returns the hook's error; the record is not persisted in that case.
    pub fn save(&self, record: Record) -> SyncResult<Option<SyncOutcome>> {
        let outcome = self.sync.on_create_or_update(&record)?;
        self.store.put(record);
        Ok(outcome)
    }

    /// Runs the destroy hook, then deletes the record.
    ///
    /// # Errors
    ///
    /// Returns the hook's error; the record is kept in that case.
    pub fn destroy(&self, record: &Record) -> SyncResult<Option<DocumentId>> {
        let document = self.sync.on_destroy(record)?;
        self.store.delete(record.type_name(), record.key());
        Ok(document)
    }

    /// Rebuilds a type.
    ///
    /// # Errors
    ///
    /// See [`Synchronizer::rebuild`].
    pub fn rebuild(&self, type_name: &str) -> SyncResult<RebuildReport> {
        self.sync.rebuild(&TypeName::new(type_name))
    }

    /// Searches a type and returns the matching record keys.
    ///
    /// # Errors
    ///
    /// See [`Synchronizer::search`].
    pub fn search_keys(&self, type_name: &str, query: &str) -> SyncResult<Vec<String>> {
        Ok(self
            .sync
            .search(&TypeName::new(type_name), query)?
            .into_iter()
            .map(|r| r.key().to_string())
            .collect())
    }
}

impl SyncHarness<RecordingEngine> {
    /// Creates a harness with a recording engine and default config.
    pub fn recording<F>(blueprints: F) -> Self
    where
        F: FnOnce(&Arc<MemoryRecordStore>) -> BlueprintRegistry,
    {
        Self::with_engine(SyncConfig::default(), RecordingEngine::new(), blueprints)
    }
}

impl SyncHarness<FtsEngine> {
    /// Creates a harness with the in-memory full-text engine and default config.
    pub fn fts<F>(blueprints: F) -> Self
    where
        F: FnOnce(&Arc<MemoryRecordStore>) -> BlueprintRegistry,
    {
        Self::with_engine(SyncConfig::default(), FtsEngine::new(), blueprints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{people_and_articles, person, Call};
    use searchsync_core::SyncError;

    #[test]
    fn save_persists_after_hook() {
        let harness = SyncHarness::recording(people_and_articles);
        let kogler = person(1, "Kogler");
        harness.save(kogler.clone()).unwrap();

        assert_eq!(harness.store.count(&TypeName::new("Person")), 1);
        assert_eq!(harness.engine.calls(), vec![Call::upsert("Person-1", &kogler, ["name"])]);
    }

    #[test]
    fn failing_hook_aborts_save() {
        let harness = SyncHarness::recording(people_and_articles);
        harness
            .engine
            .fail_with(|| SyncError::engine_unavailable("offline"));

        assert!(harness.save(person(1, "Kogler")).is_err());
        assert!(harness.store.is_empty());
    }

    #[test]
    fn destroy_deletes_after_hook() {
        let harness = SyncHarness::recording(people_and_articles);
        let kogler = person(1, "Kogler");
        harness.seed(kogler.clone());

        let document = harness.destroy(&kogler).unwrap();
        assert_eq!(document, Some(DocumentId::new("Person-1")));
        assert!(harness.store.is_empty());
    }
}
