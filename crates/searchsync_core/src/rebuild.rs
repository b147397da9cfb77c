//! Full re-indexation of a record type.

use crate::changes::ChangeSet;
use crate::config::MissingRecordPolicy;
use crate::decision::{decide, Decision, Trigger};
use crate::error::{SyncError, SyncResult};
use crate::sync::Synchronizer;
use crate::types::TypeName;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Summary of a rebuild.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RebuildReport {
    /// Type that was rebuilt.
    pub type_name: String,
    /// Documents upserted.
    pub indexed: usize,
    /// Documents removed because the blueprint excludes their record.
    pub removed: usize,
    /// Records that disappeared before they could be read.
    pub missing: usize,
    /// Wall-clock duration.
    #[serde(skip)]
    pub elapsed: Duration,
}

impl RebuildReport {
    /// Returns the number of indexed documents.
    pub fn count(&self) -> usize {
        self.indexed
    }

    /// Returns the number of records visited.
    pub fn visited(&self) -> usize {
        self.indexed + self.removed + self.missing
    }
}

impl Synchronizer {
    /// Re-indexes every record of a type.
    ///
    /// Each record is upserted, or removed if its blueprint excludes it.
    /// The autoindex flag is ignored, there is no change-tracking
    /// short-circuit, and dependents are not cascaded. The index is not
    /// cleared first; stale documents of records that no longer exist stay
    /// until the caller wipes them.
    ///
    /// Callers should not run a rebuild concurrently with other writers of
    /// the same type.
    ///
    /// # Errors
    ///
    /// Returns `UnknownType` for unregistered types, engine errors, and,
    /// under [`MissingRecordPolicy::Abort`], `RecordNotFound`.
    pub fn rebuild(&self, type_name: &TypeName) -> SyncResult<RebuildReport> {
        let blueprint = self.blueprints.config_for(type_name)?;
        let started = Instant::now();
        let mut report = RebuildReport {
            type_name: type_name.to_string(),
            ..RebuildReport::default()
        };

        for item in self.store.all_records_of(type_name)? {
            let record = match item {
                Ok(record) => record,
                Err(SyncError::RecordNotFound { type_name, key })
                    if self.config.missing_records == MissingRecordPolicy::Skip =>
                {
                    warn!(%type_name, %key, "record disappeared during rebuild, skipping");
                    report.missing += 1;
                    continue;
                }
                Err(err) => return Err(err),
            };

            let document = self.document_id(&record)?;
            let changes = ChangeSet::all_of(record.attributes());
            let decision = decide(blueprint, &record, &changes, Trigger::Rebuild);
            self.apply(&document, &record, &changes, decision)?;

            match decision {
                Decision::Upsert => report.indexed += 1,
                Decision::Remove => report.removed += 1,
                Decision::Skip(_) => {}
            }
        }

        report.elapsed = started.elapsed();
        info!(
            type_name = %type_name,
            indexed = report.indexed,
            removed = report.removed,
            missing = report.missing,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "rebuild finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::{Blueprint, BlueprintRegistry, DependencyRule};
    use crate::config::SyncConfig;
    use crate::record::Record;
    use crate::store::{MemoryRecordStore, RecordIter, RecordStore};
    use crate::test_support::{Call, RecordingEngine};
    use crate::types::RecordKey;
    use crate::value::Attributes;
    use std::sync::Arc;

    fn people(store: &MemoryRecordStore, n: i64) {
        for i in 1..=n {
            store.put(Record::new("Person", i).with("name", format!("P{i}")).with("hidden", i % 2 == 0));
        }
    }

    fn sync_with(
        blueprint: Blueprint,
        store: Arc<dyn RecordStore>,
        config: SyncConfig,
    ) -> (Synchronizer, Arc<RecordingEngine>) {
        let engine = Arc::new(RecordingEngine::new());
        let registry = BlueprintRegistry::new().with("Person", blueprint);
        (Synchronizer::new(config, registry, store, engine.clone()), engine)
    }

    #[test]
    fn rebuild_upserts_every_record() {
        let store = Arc::new(MemoryRecordStore::new());
        people(&store, 3);
        let (sync, engine) = sync_with(Blueprint::new(), store, SyncConfig::default());

        let report = sync.rebuild(&TypeName::new("Person")).unwrap();
        assert_eq!(report.count(), 3);
        assert_eq!(report.visited(), 3);
        let docs: Vec<_> = engine.calls().iter().map(|c| c.document().to_string()).collect();
        assert_eq!(docs, vec!["Person-1", "Person-2", "Person-3"]);
    }

    #[test]
    fn rebuild_ignores_autoindex_flag() {
        let store = Arc::new(MemoryRecordStore::new());
        people(&store, 2);
        let (sync, _) = sync_with(Blueprint::new().autoindex(false), store, SyncConfig::default());
        assert_eq!(sync.rebuild(&TypeName::new("Person")).unwrap().count(), 2);
    }

    #[test]
    fn rebuild_removes_excluded_records() {
        let store = Arc::new(MemoryRecordStore::new());
        people(&store, 4);
        let bp = Blueprint::new()
            .exclude_when(|r| r.attribute("hidden").and_then(|v| v.as_bool()) == Some(true));
        let (sync, engine) = sync_with(bp, store, SyncConfig::default());

        let report = sync.rebuild(&TypeName::new("Person")).unwrap();
        assert_eq!(report.indexed, 2);
        assert_eq!(report.removed, 2);
        assert!(engine.calls().contains(&Call::remove("Person-2")));
        assert!(engine.calls().contains(&Call::remove("Person-4")));
    }

    #[test]
    fn rebuild_does_not_cascade() {
        let store = Arc::new(MemoryRecordStore::new());
        people(&store, 2);
        let bp = Blueprint::new().depends_on(DependencyRule::new(["name"], |_| {
            Err("must not be called".into())
        }));
        let (sync, engine) = sync_with(bp, store, SyncConfig::default());

        assert_eq!(sync.rebuild(&TypeName::new("Person")).unwrap().count(), 2);
        assert_eq!(engine.calls().len(), 2);
    }

    #[test]
    fn rebuild_tags_upserts_with_all_attributes() {
        let store = Arc::new(MemoryRecordStore::new());
        people(&store, 1);
        let (sync, engine) = sync_with(Blueprint::new(), store.clone(), SyncConfig::default());

        sync.rebuild(&TypeName::new("Person")).unwrap();
        let record = store.find(&TypeName::new("Person"), &RecordKey::from(1i64)).unwrap().unwrap();
        assert_eq!(engine.calls(), vec![Call::upsert("Person-1", &record, ["hidden", "name"])]);
    }

    #[test]
    fn rebuild_of_unknown_type_fails() {
        let store = Arc::new(MemoryRecordStore::new());
        let (sync, _) = sync_with(Blueprint::new(), store, SyncConfig::default());
        assert!(matches!(
            sync.rebuild(&TypeName::new("Ghost")),
            Err(SyncError::UnknownType { .. })
        ));
    }

    /// Store whose enumeration reports one vanished record.
    struct FlakyStore;

    impl RecordStore for FlakyStore {
        fn snapshot_of(&self, _record: &Record) -> SyncResult<Option<Attributes>> {
            Ok(None)
        }

        fn all_records_of(&self, _type_name: &TypeName) -> SyncResult<RecordIter<'_>> {
            Ok(Box::new(
                vec![
                    Ok(Record::new("Person", 1i64)),
                    Err(SyncError::record_not_found("Person", "2")),
                    Ok(Record::new("Person", 3i64)),
                ]
                .into_iter(),
            ))
        }

        fn find(&self, _type_name: &TypeName, _key: &RecordKey) -> SyncResult<Option<Record>> {
            Ok(None)
        }
    }

    #[test]
    fn missing_records_are_skipped_by_default() {
        let (sync, engine) = sync_with(Blueprint::new(), Arc::new(FlakyStore), SyncConfig::default());
        let report = sync.rebuild(&TypeName::new("Person")).unwrap();
        assert_eq!(report.indexed, 2);
        assert_eq!(report.missing, 1);
        assert_eq!(engine.calls().len(), 2);
    }

    #[test]
    fn missing_records_can_abort() {
        let config = SyncConfig::new().with_missing_records(MissingRecordPolicy::Abort);
        let (sync, engine) = sync_with(Blueprint::new(), Arc::new(FlakyStore), config);
        let err = sync.rebuild(&TypeName::new("Person")).unwrap_err();
        assert!(matches!(err, SyncError::RecordNotFound { .. }));
        assert_eq!(engine.calls().len(), 1);
    }

    #[test]
    fn engine_failure_aborts_rebuild() {
        let store = Arc::new(MemoryRecordStore::new());
        people(&store, 3);
        let (sync, engine) = sync_with(Blueprint::new(), store, SyncConfig::default());
        engine.fail_with(|| SyncError::engine_write_failed("Person-1", "rejected"));
        assert!(sync.rebuild(&TypeName::new("Person")).unwrap_err().is_engine_error());
    }
}
