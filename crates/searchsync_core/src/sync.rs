//! The synchronizer: hook registration and the mutation entry points.
//!
//! A [`Synchronizer`] is built once, when type configuration is loaded.
//! Construction is the registration step: every type whose blueprint has
//! autoindexing on gets hooks, every other type gets none. The record store
//! then asks for a type's [`Hooks`] and calls them from its commit pipeline.
//!
//! ```text
//! commit(record)
//!   └─> hooks.on_create_or_update(record)
//!         ├─> store.snapshot_of(record)  ──> changed_attributes
//!         ├─> decide(Trigger::Update)    ──> engine.upsert / engine.remove
//!         └─> deps::resolve              ──> decide(Trigger::Cascade) per dependent
//! ```
//!
//! Everything runs on the caller's thread. Errors are returned as-is so the
//! caller can abort its commit.

use crate::blueprint::{Blueprint, BlueprintRegistry};
use crate::changes::{changed_attributes, ChangeSet};
use crate::config::SyncConfig;
use crate::decision::{decide, Decision, Trigger};
use crate::deps;
use crate::engine::IndexingEngine;
use crate::error::{SyncError, SyncResult};
use crate::identity::{DocumentIdentity, IdentityCodec};
use crate::record::Record;
use crate::store::RecordStore;
use crate::types::{DocumentId, TypeName};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// What a create/update hook did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Identity of the mutated record's document.
    pub document: DocumentId,
    /// Decision taken for the mutated record.
    pub decision: Decision,
    /// Decisions taken for dependents, in resolution order.
    pub dependents: Vec<(DocumentId, Decision)>,
}

impl SyncOutcome {
    /// Returns the number of engine writes the hook performed.
    pub fn writes(&self) -> usize {
        usize::from(self.decision.touches_index())
            + self
                .dependents
                .iter()
                .filter(|(_, d)| d.touches_index())
                .count()
    }
}

/// Keeps an indexing engine in sync with a record store.
pub struct Synchronizer {
    pub(crate) config: SyncConfig,
    pub(crate) codec: Arc<dyn IdentityCodec>,
    pub(crate) blueprints: Arc<BlueprintRegistry>,
    pub(crate) wired: HashSet<TypeName>,
    pub(crate) store: Arc<dyn RecordStore>,
    pub(crate) engine: Arc<dyn IndexingEngine>,
}

impl Synchronizer {
    /// Creates a synchronizer and wires hooks for autoindexed types.
    pub fn new(
        config: SyncConfig,
        blueprints: BlueprintRegistry,
        store: Arc<dyn RecordStore>,
        engine: Arc<dyn IndexingEngine>,
    ) -> Self {
        let codec = config.codec();
        let mut sync = Self {
            config,
            codec,
            blueprints: Arc::new(BlueprintRegistry::new()),
            wired: HashSet::new(),
            store,
            engine,
        };
        sync.reregister(blueprints);
        sync
    }

    /// Replaces the type configuration and recomputes hook wiring.
    ///
    /// Changing a blueprint at runtime has no effect until this is called.
    pub fn reregister(&mut self, blueprints: BlueprintRegistry) {
        self.wired = blueprints
            .iter()
            .filter(|(_, bp)| bp.is_autoindexed())
            .map(|(name, _)| name.clone())
            .collect();
        info!(
            types = blueprints.len(),
            wired = self.wired.len(),
            "registered index hooks"
        );
        self.blueprints = Arc::new(blueprints);
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Returns the registered blueprints.
    pub fn blueprints(&self) -> &BlueprintRegistry {
        &self.blueprints
    }

    /// Returns true if hooks are wired for the type.
    pub fn is_wired(&self, type_name: &TypeName) -> bool {
        self.wired.contains(type_name)
    }

    /// Returns the hooks for a type, or `None` if none are wired.
    pub fn hooks_for(&self, type_name: &TypeName) -> Option<Hooks<'_>> {
        if !self.wired.contains(type_name) {
            return None;
        }
        let blueprint = self.blueprints.config_for(type_name).ok()?;
        Some(Hooks {
            sync: self,
            type_name: type_name.clone(),
            blueprint,
        })
    }

    /// Create/update hook for any record.
    ///
    /// Returns `Ok(None)` when no hooks are wired for the record's type.
    ///
    /// # Errors
    ///
    /// See [`Hooks::on_create_or_update`].
    pub fn on_create_or_update(&self, record: &Record) -> SyncResult<Option<SyncOutcome>> {
        self.hooks_for(record.type_name())
            .map(|hooks| hooks.on_create_or_update(record))
            .transpose()
    }

    /// Destroy hook for any record.
    ///
    /// Returns `Ok(None)` when no hooks are wired for the record's type.
    ///
    /// # Errors
    ///
    /// See [`Hooks::on_destroy`].
    pub fn on_destroy(&self, record: &Record) -> SyncResult<Option<DocumentId>> {
        self.hooks_for(record.type_name())
            .map(|hooks| hooks.on_destroy(record))
            .transpose()
    }

    /// Encodes the document identity of a record.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTypeName` if the codec cannot represent the type.
    pub fn document_id(&self, record: &Record) -> SyncResult<DocumentId> {
        let key = self.store.primary_key_of(record);
        self.codec.encode(record.type_name(), &key)
    }

    /// Decodes a document identity.
    ///
    /// # Errors
    ///
    /// Returns `MalformedIdentity` if the identity cannot be decoded.
    pub fn decode(&self, identity: &str) -> SyncResult<DocumentIdentity> {
        self.codec.decode(identity)
    }

    /// Reconstructs the record a document identity points at.
    ///
    /// Returns `Ok(None)` if the record no longer exists.
    ///
    /// # Errors
    ///
    /// Returns `MalformedIdentity` for undecodable identities and
    /// `UnknownType` if the decoded type has no blueprint.
    pub fn load(&self, identity: &str) -> SyncResult<Option<Record>> {
        let decoded = self.codec.decode(identity)?;
        if !self.blueprints.contains(&decoded.type_name) {
            return Err(SyncError::unknown_type(decoded.type_name.as_str()));
        }
        self.store.find(&decoded.type_name, &decoded.key)
    }

    /// Queries the engine and loads the matching records.
    ///
    /// Hits whose record no longer exists are dropped.
    ///
    /// # Errors
    ///
    /// Returns `UnknownType` for unregistered types, and any engine or
    /// store error.
    pub fn search(&self, type_name: &TypeName, query: &str) -> SyncResult<Vec<Record>> {
        self.blueprints.config_for(type_name)?;
        let hits = self.engine.search(type_name, query)?;
        self.load_hits(&hits)
    }

    /// Loads the records behind engine hits, in hit order.
    ///
    /// Hits whose record no longer exists are dropped.
    ///
    /// # Errors
    ///
    /// Returns `MalformedIdentity`, `UnknownType`, or store errors.
    pub fn load_hits(&self, hits: &[DocumentId]) -> SyncResult<Vec<Record>> {
        let mut records = Vec::with_capacity(hits.len());
        for hit in hits {
            match self.load(hit.as_str())? {
                Some(record) => records.push(record),
                None => debug!(document = %hit, "dropping search hit for missing record"),
            }
        }
        Ok(records)
    }

    /// Writes a decision to the engine.
    pub(crate) fn apply(
        &self,
        document: &DocumentId,
        record: &Record,
        changes: &ChangeSet,
        decision: Decision,
    ) -> SyncResult<()> {
        match decision {
            Decision::Upsert => self.engine.upsert(document, record, changes),
            Decision::Remove => self.engine.remove(document),
            Decision::Skip(_) => Ok(()),
        }
    }

    /// Reindexes the dependents of `record`, one hop deep.
    fn cascade(
        &self,
        blueprint: &Blueprint,
        record: &Record,
        changes: &ChangeSet,
    ) -> SyncResult<Vec<(DocumentId, Decision)>> {
        let dependents = deps::resolve(blueprint, record, changes)?;
        let mut applied = Vec::with_capacity(dependents.len());

        for dependent in &dependents {
            let dependent_blueprint = self.blueprints.config_for(dependent.type_name())?;
            let document = self.document_id(dependent)?;
            let decision = decide(dependent_blueprint, dependent, changes, Trigger::Cascade);
            debug!(
                source = %record.type_name(),
                document = %document,
                %decision,
                "cascade"
            );
            self.apply(&document, dependent, changes, decision)?;
            applied.push((document, decision));
        }

        Ok(applied)
    }
}

impl std::fmt::Debug for Synchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Synchronizer")
            .field("config", &self.config)
            .field("types", &self.blueprints.len())
            .field("wired", &self.wired.len())
            .finish_non_exhaustive()
    }
}

/// Commit hook handles for one type.
///
/// Obtained from [`Synchronizer::hooks_for`]; only exists for types with
/// autoindexing on.
pub struct Hooks<'a> {
    sync: &'a Synchronizer,
    type_name: TypeName,
    blueprint: &'a Blueprint,
}

impl Hooks<'_> {
    /// Returns the type these hooks are wired for.
    pub fn type_name(&self) -> &TypeName {
        &self.type_name
    }

    /// Runs after a record of this type is created or updated.
    ///
    /// Diffs the record against its persisted snapshot, then applies
    /// [`on_create_or_update_with_changes`](Self::on_create_or_update_with_changes).
    ///
    /// # Errors
    ///
    /// Store, engine, identity and resolver errors are returned unretried.
    pub fn on_create_or_update(&self, record: &Record) -> SyncResult<SyncOutcome> {
        let prior = self.sync.store.snapshot_of(record)?;
        let changes = changed_attributes(prior.as_ref(), record.attributes());
        self.on_create_or_update_with_changes(record, &changes)
    }

    /// Runs the update path with a change set the caller already knows.
    ///
    /// An empty change set is a no-op. Otherwise the record is upserted or,
    /// if its blueprint excludes it, removed; then its dependents are
    /// reindexed whichever branch was taken.
    ///
    /// # Errors
    ///
    /// Engine, identity and resolver errors are returned unretried. Writes
    /// made before the error are not rolled back.
    pub fn on_create_or_update_with_changes(
        &self,
        record: &Record,
        changes: &ChangeSet,
    ) -> SyncResult<SyncOutcome> {
        self.check_type(record)?;
        let document = self.sync.document_id(record)?;
        let decision = decide(self.blueprint, record, changes, Trigger::Update);
        debug!(document = %document, %changes, %decision, "update");

        if !decision.touches_index() {
            return Ok(SyncOutcome {
                document,
                decision,
                dependents: Vec::new(),
            });
        }

        self.sync.apply(&document, record, changes, decision)?;
        let dependents = self.sync.cascade(self.blueprint, record, changes)?;

        Ok(SyncOutcome {
            document,
            decision,
            dependents,
        })
    }

    /// Runs after a record of this type is destroyed.
    ///
    /// Always removes the record's document. The exclusion predicate is not
    /// consulted and dependents are not reindexed.
    ///
    /// # Errors
    ///
    /// Engine and identity errors are returned unretried.
    pub fn on_destroy(&self, record: &Record) -> SyncResult<DocumentId> {
        self.check_type(record)?;
        let document = self.sync.document_id(record)?;
        debug!(document = %document, "destroy");
        self.sync.engine.remove(&document)?;
        Ok(document)
    }

    fn check_type(&self, record: &Record) -> SyncResult<()> {
        if record.type_name() == &self.type_name {
            Ok(())
        } else {
            Err(SyncError::invalid_type_name(
                record.type_name().as_str(),
                format!("hooks are wired for {}", self.type_name),
            ))
        }
    }
}

impl std::fmt::Debug for Hooks<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::DependencyRule;
    use crate::decision::SkipReason;
    use crate::store::MemoryRecordStore;
    use crate::test_support::{Call, RecordingEngine};

    fn setup(blueprints: BlueprintRegistry) -> (Synchronizer, Arc<MemoryRecordStore>, Arc<RecordingEngine>) {
        let store = Arc::new(MemoryRecordStore::new());
        let engine = Arc::new(RecordingEngine::new());
        let sync = Synchronizer::new(SyncConfig::default(), blueprints, store.clone(), engine.clone());
        (sync, store, engine)
    }

    fn kogler() -> Record {
        Record::new("Person", 1i64).with("name", "Kogler")
    }

    #[test]
    fn example_scenario() {
        let (sync, _, engine) = setup(BlueprintRegistry::new().with("Person", Blueprint::new()));
        let s = kogler();

        let outcome = sync.on_create_or_update(&s).unwrap().unwrap();
        assert_eq!(outcome.decision, Decision::Upsert);
        sync.on_destroy(&s).unwrap();

        assert_eq!(
            engine.calls(),
            vec![
                Call::upsert("Person-1", &s, ["name"]),
                Call::remove("Person-1"),
            ]
        );
    }

    #[test]
    fn no_op_save_makes_no_engine_call() {
        let (sync, store, engine) = setup(BlueprintRegistry::new().with("Person", Blueprint::new()));
        store.put(kogler());

        let outcome = sync.on_create_or_update(&kogler()).unwrap().unwrap();
        assert_eq!(outcome.decision, Decision::Skip(SkipReason::NoChanges));
        assert_eq!(outcome.writes(), 0);
        assert!(engine.calls().is_empty());
    }

    #[test]
    fn update_is_tagged_with_changed_attributes_only() {
        let (sync, store, engine) = setup(BlueprintRegistry::new().with("Person", Blueprint::new()));
        store.put(kogler().with("age", 41));

        let edited = kogler().with("age", 42);
        sync.on_create_or_update(&edited).unwrap();
        assert_eq!(engine.calls(), vec![Call::upsert("Person-1", &edited, ["age"])]);
    }

    #[test]
    fn unwired_types_get_no_hooks() {
        let (sync, _, engine) = setup(
            BlueprintRegistry::new().with("Person", Blueprint::new().autoindex(false)),
        );

        assert!(sync.hooks_for(&TypeName::new("Person")).is_none());
        assert!(sync.on_create_or_update(&kogler()).unwrap().is_none());
        assert!(sync.on_destroy(&kogler()).unwrap().is_none());
        assert!(sync.on_create_or_update(&Record::new("Comment", 1i64)).unwrap().is_none());
        assert!(engine.calls().is_empty());
    }

    #[test]
    fn reregister_rewires_hooks() {
        let (mut sync, _, engine) = setup(
            BlueprintRegistry::new().with("Person", Blueprint::new().autoindex(false)),
        );
        assert!(!sync.is_wired(&TypeName::new("Person")));

        sync.reregister(BlueprintRegistry::new().with("Person", Blueprint::new()));
        assert!(sync.is_wired(&TypeName::new("Person")));
        sync.on_create_or_update(&kogler()).unwrap();
        assert_eq!(engine.calls().len(), 1);
    }

    #[test]
    fn excluded_record_is_removed_not_upserted() {
        let bp = Blueprint::new().exclude_when(|r| r.text("name") == Some("Hidden"));
        let (sync, store, engine) = setup(BlueprintRegistry::new().with("Person", bp));
        store.put(kogler());

        let hidden = Record::new("Person", 1i64).with("name", "Hidden");
        let outcome = sync.on_create_or_update(&hidden).unwrap().unwrap();
        assert_eq!(outcome.decision, Decision::Remove);
        assert_eq!(engine.calls(), vec![Call::remove("Person-1")]);
    }

    #[test]
    fn destroy_ignores_exclusion_predicate() {
        let bp = Blueprint::new().exclude_when(|_| false);
        let (sync, _, engine) = setup(BlueprintRegistry::new().with("Person", bp));

        let doc = sync.on_destroy(&kogler()).unwrap().unwrap();
        assert_eq!(doc.as_str(), "Person-1");
        assert_eq!(engine.calls(), vec![Call::remove("Person-1")]);
    }

    #[test]
    fn cascade_upserts_dependent_with_same_tag() {
        let article = Record::new("Article", 7i64).with("title", "Interview");
        let dependent = article.clone();
        let registry = BlueprintRegistry::new()
            .with(
                "Person",
                Blueprint::new().depends_on(DependencyRule::new(["name"], move |_| {
                    Ok(vec![dependent.clone()])
                })),
            )
            .with("Article", Blueprint::new().autoindex(false));
        let (sync, _, engine) = setup(registry);

        let outcome = sync.on_create_or_update(&kogler()).unwrap().unwrap();
        assert_eq!(outcome.dependents, vec![(DocumentId::new("Article-7"), Decision::Upsert)]);
        assert_eq!(outcome.writes(), 2);
        assert_eq!(
            engine.calls(),
            vec![
                Call::upsert("Person-1", &kogler(), ["name"]),
                Call::upsert("Article-7", &article, ["name"]),
            ]
        );
    }

    #[test]
    fn cascade_runs_even_when_source_is_excluded() {
        let registry = BlueprintRegistry::new()
            .with(
                "Person",
                Blueprint::new()
                    .exclude_when(|_| true)
                    .depends_on(DependencyRule::new(["name"], |_| {
                        Ok(vec![Record::new("Article", 7i64)])
                    })),
            )
            .with(
                "Article",
                Blueprint::new().exclude_when(|r| r.attribute("draft").is_some()),
            );
        let (sync, _, engine) = setup(registry);

        sync.on_create_or_update(&kogler()).unwrap();
        assert_eq!(
            engine.calls(),
            vec![
                Call::remove("Person-1"),
                Call::upsert("Article-7", &Record::new("Article", 7i64), ["name"]),
            ]
        );
    }

    #[test]
    fn cascade_is_one_hop() {
        let registry = BlueprintRegistry::new()
            .with(
                "Person",
                Blueprint::new().depends_on(DependencyRule::new(["name"], |_| {
                    Ok(vec![Record::new("Article", 1i64).with("name", "x")])
                })),
            )
            .with(
                "Article",
                Blueprint::new().depends_on(DependencyRule::new(["name"], |_| {
                    Ok(vec![Record::new("Person", 1i64)])
                })),
            );
        let (sync, _, engine) = setup(registry);

        sync.on_create_or_update(&kogler()).unwrap();
        assert_eq!(engine.calls().len(), 2);
    }

    #[test]
    fn dependent_of_unknown_type_fails() {
        let registry = BlueprintRegistry::new().with(
            "Person",
            Blueprint::new().depends_on(DependencyRule::new(["name"], |_| {
                Ok(vec![Record::new("Ghost", 1i64)])
            })),
        );
        let (sync, _, _) = setup(registry);
        let err = sync.on_create_or_update(&kogler()).unwrap_err();
        assert!(matches!(err, SyncError::UnknownType { .. }));
    }

    #[test]
    fn resolver_failure_leaves_earlier_writes() {
        let registry = BlueprintRegistry::new()
            .with(
                "Person",
                Blueprint::new()
                    .depends_on(DependencyRule::new(["name"], |_| Err("boom".into()))),
            );
        let (sync, _, engine) = setup(registry);

        let err = sync.on_create_or_update(&kogler()).unwrap_err();
        assert!(matches!(err, SyncError::ResolverFailure { rule: 0, .. }));
        assert_eq!(engine.calls(), vec![Call::upsert("Person-1", &kogler(), ["name"])]);
    }

    #[test]
    fn engine_failure_propagates() {
        let (sync, _, engine) = setup(BlueprintRegistry::new().with("Person", Blueprint::new()));
        engine.fail_with(|| SyncError::engine_unavailable("connection refused"));

        let err = sync.on_create_or_update(&kogler()).unwrap_err();
        assert!(err.is_engine_error());
        let err = sync.on_destroy(&kogler()).unwrap_err();
        assert!(err.is_engine_error());
    }

    #[test]
    fn hooks_reject_foreign_records() {
        let (sync, _, _) = setup(
            BlueprintRegistry::new()
                .with("Person", Blueprint::new())
                .with("Article", Blueprint::new()),
        );
        let hooks = sync.hooks_for(&TypeName::new("Person")).unwrap();
        let err = hooks.on_destroy(&Record::new("Article", 1i64)).unwrap_err();
        assert!(matches!(err, SyncError::InvalidTypeName { .. }));
    }

    #[test]
    fn load_reconstructs_records() {
        let (sync, store, _) = setup(BlueprintRegistry::new().with("Person", Blueprint::new()));
        store.put(kogler());

        assert_eq!(sync.load("Person-1").unwrap(), Some(kogler()));
        assert_eq!(sync.load("Person-2").unwrap(), None);
        assert!(matches!(sync.load("Person"), Err(SyncError::MalformedIdentity { .. })));
        assert!(matches!(sync.load("Ghost-1"), Err(SyncError::UnknownType { .. })));
    }

    #[test]
    fn search_drops_hits_for_missing_records() {
        let (sync, store, engine) = setup(BlueprintRegistry::new().with("Person", Blueprint::new()));
        store.put(kogler());
        engine.set_search_results(vec![DocumentId::new("Person-1"), DocumentId::new("Person-9")]);

        let found = sync.search(&TypeName::new("Person"), "kogler").unwrap();
        assert_eq!(found, vec![kogler()]);
        assert!(sync.search(&TypeName::new("Ghost"), "x").is_err());
    }

    #[test]
    fn load_hits_keeps_order_and_drops_missing() {
        let (sync, store, _) = setup(BlueprintRegistry::new().with("Person", Blueprint::new()));
        let huber = Record::new("Person", 2i64).with("name", "Huber");
        store.put(kogler());
        store.put(huber.clone());

        let hits = [
            DocumentId::new("Person-2"),
            DocumentId::new("Person-9"),
            DocumentId::new("Person-1"),
        ];
        assert_eq!(sync.load_hits(&hits).unwrap(), vec![huber, kogler()]);
        assert!(sync.load_hits(&[]).unwrap().is_empty());
        assert!(matches!(
            sync.load_hits(&[DocumentId::new("Ghost-1")]),
            Err(SyncError::UnknownType { .. })
        ));
    }
}
