//! Engine double shared by the unit tests of this crate.

use crate::changes::ChangeSet;
use crate::engine::IndexingEngine;
use crate::error::{SyncError, SyncResult};
use crate::record::Record;
use crate::types::{DocumentId, TypeName};
use parking_lot::Mutex;

/// One call received by [`RecordingEngine`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Upsert {
        document: DocumentId,
        record: Record,
        changes: ChangeSet,
    },
    Remove {
        document: DocumentId,
    },
}

impl Call {
    pub fn upsert<'a>(document: &str, record: &Record, changes: impl IntoIterator<Item = &'a str>) -> Self {
        Call::Upsert {
            document: DocumentId::new(document),
            record: record.clone(),
            changes: changes.into_iter().collect(),
        }
    }

    pub fn remove(document: &str) -> Self {
        Call::Remove {
            document: DocumentId::new(document),
        }
    }

    pub fn document(&self) -> &DocumentId {
        match self {
            Call::Upsert { document, .. } | Call::Remove { document } => document,
        }
    }
}

type FailureFn = Box<dyn Fn() -> SyncError + Send + Sync>;

/// Records every write; optionally fails them all.
#[derive(Default)]
pub struct RecordingEngine {
    calls: Mutex<Vec<Call>>,
    failure: Mutex<Option<FailureFn>>,
    search_results: Mutex<Vec<DocumentId>>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn fail_with(&self, failure: impl Fn() -> SyncError + Send + Sync + 'static) {
        *self.failure.lock() = Some(Box::new(failure));
    }

    pub fn set_search_results(&self, results: Vec<DocumentId>) {
        *self.search_results.lock() = results;
    }

    fn check(&self) -> SyncResult<()> {
        match self.failure.lock().as_ref() {
            Some(failure) => Err(failure()),
            None => Ok(()),
        }
    }
}

impl IndexingEngine for RecordingEngine {
    fn upsert(&self, document: &DocumentId, record: &Record, changes: &ChangeSet) -> SyncResult<()> {
        self.check()?;
        self.calls.lock().push(Call::Upsert {
            document: document.clone(),
            record: record.clone(),
            changes: changes.clone(),
        });
        Ok(())
    }

    fn remove(&self, document: &DocumentId) -> SyncResult<()> {
        self.check()?;
        self.calls.lock().push(Call::Remove {
            document: document.clone(),
        });
        Ok(())
    }

    fn search(&self, _type_name: &TypeName, _query: &str) -> SyncResult<Vec<DocumentId>> {
        self.check()?;
        Ok(self.search_results.lock().clone())
    }
}
