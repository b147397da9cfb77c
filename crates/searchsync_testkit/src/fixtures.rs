//! Test fixtures.
//!
//! Provides an engine double that records every write, the people/articles
//! scenario used across the integration suites, and temporary dataset
//! files for the CLI.

use parking_lot::Mutex;
use searchsync_core::{
    Blueprint, BlueprintRegistry, ChangeSet, DependencyRule, DocumentId, IndexingEngine,
    MemoryRecordStore, Record, RecordKey, RecordStore, SyncError, SyncResult, TypeName, Value,
};
use std::path::Path;
use std::sync::Arc;
use tempfile::NamedTempFile;

/// One call received by [`RecordingEngine`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    /// `upsert(document, record, changes)`.
    Upsert {
        /// Target document.
        document: DocumentId,
        /// Record as passed to the engine.
        record: Record,
        /// Change tag.
        changes: ChangeSet,
    },
    /// `remove(document)`.
    Remove {
        /// Target document.
        document: DocumentId,
    },
}

impl Call {
    /// Builds an expected upsert.
    pub fn upsert<'a>(
        document: &str,
        record: &Record,
        changes: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        Call::Upsert {
            document: DocumentId::new(document),
            record: record.clone(),
            changes: changes.into_iter().collect(),
        }
    }

    /// Builds an expected remove.
    pub fn remove(document: &str) -> Self {
        Call::Remove {
            document: DocumentId::new(document),
        }
    }

    /// Returns the target document.
    pub fn document(&self) -> &DocumentId {
        match self {
            Call::Upsert { document, .. } | Call::Remove { document } => document,
        }
    }

    /// Returns true for upserts.
    pub fn is_upsert(&self) -> bool {
        matches!(self, Call::Upsert { .. })
    }
}

type FailureFn = Box<dyn Fn() -> SyncError + Send + Sync>;

/// Engine double that records every call.
///
/// Optionally fails every call with an error of the test's choosing.
#[derive(Default)]
pub struct RecordingEngine {
    calls: Mutex<Vec<Call>>,
    failure: Mutex<Option<FailureFn>>,
}

impl RecordingEngine {
    /// Creates an engine with no recorded calls.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every write received so far.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Forgets recorded calls.
    pub fn reset(&self) {
        self.calls.lock().clear();
    }

    /// Makes every following call fail.
    pub fn fail_with(&self, failure: impl Fn() -> SyncError + Send + Sync + 'static) {
        *self.failure.lock() = Some(Box::new(failure));
    }

    /// Stops failing.
    pub fn recover(&self) {
        *self.failure.lock() = None;
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
        Ok(Vec::new())
    }
}

impl std::fmt::Debug for RecordingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingEngine")
            .field("calls", &self.calls.lock().len())
            .finish_non_exhaustive()
    }
}

/// Builds a person record.
pub fn person(key: i64, name: &str) -> Record {
    Record::new("Person", key).with("name", name)
}

/// Builds an article record written by `author`.
pub fn article(key: i64, author: i64, title: &str) -> Record {
    Record::new("Article", key)
        .with("author_id", author)
        .with("title", title)
}

/// Builds a draft record. Drafts are never autoindexed.
pub fn draft(key: i64, body: &str) -> Record {
    Record::new("Draft", key).with("body", body)
}

/// Returns the articles written by `author`.
///
/// # Errors
///
/// Returns any store error.
pub fn articles_by(store: &dyn RecordStore, author: &RecordKey) -> SyncResult<Vec<Record>> {
    let mut articles = Vec::new();
    for item in store.all_records_of(&TypeName::new("Article"))? {
        let article = item?;
        let written_by = article
            .attribute("author_id")
            .and_then(Value::as_integer)
            .map(RecordKey::from);
        if written_by.as_ref() == Some(author) {
            articles.push(article);
        }
    }
    Ok(articles)
}

/// The people/articles scenario.
///
/// - `Person`: autoindexed; excluded once `deleted_at` is set; a change
///   to `name` reindexes the person's articles.
/// - `Article`: autoindexed; excluded while `hidden` is true.
/// - `Draft`: autoindex off.
pub fn people_and_articles(store: &Arc<MemoryRecordStore>) -> BlueprintRegistry {
    let lookup = Arc::clone(store);
    let person = Blueprint::new()
        .exclude_when(|r| r.attribute("deleted_at").is_some_and(|v| !v.is_null()))
        .depends_on(DependencyRule::new(["name"], move |p: &Record| {
            Ok(articles_by(lookup.as_ref(), p.key())?)
        }));
    let article = Blueprint::new()
        .exclude_when(|r| r.attribute("hidden").and_then(Value::as_bool) == Some(true));

    BlueprintRegistry::new()
        .with("Person", person)
        .with("Article", article)
        .with("Draft", Blueprint::new().autoindex(false))
}

/// The people/articles scenario as a CLI dataset document.
pub fn people_and_articles_dataset() -> serde_json::Value {
    serde_json::json!({
        "blueprints": {
            "Person": {
                "exclude_when": { "attribute": "deleted", "equals": true },
                "dependencies": [
                    { "watch": ["name"], "target_type": "Article", "foreign_key": "author_id" }
                ]
            },
            "Article": {
                "exclude_when": { "attribute": "hidden", "equals": true }
            },
            "Draft": { "autoindex": false }
        },
        "records": [
            { "type": "Person", "key": "1", "attributes": { "name": "Kogler" } },
            { "type": "Person", "key": "2", "attributes": { "name": "Huber", "deleted": true } },
            { "type": "Article", "key": "10", "attributes": { "author_id": 1, "title": "Alpine skiing" } },
            { "type": "Article", "key": "11", "attributes": { "author_id": 1, "title": "Skiing tours", "hidden": true } },
            { "type": "Draft", "key": "1", "attributes": { "body": "unfinished" } }
        ]
    })
}

/// A dataset written to a temporary file, removed on drop.
pub struct TempDataset {
    file: NamedTempFile,
}

impl TempDataset {
    /// Writes `document` to a fresh temporary file.
    pub fn write(document: &serde_json::Value) -> Self {
        let file = NamedTempFile::new().expect("Failed to create temp file");
        serde_json::to_writer_pretty(file.as_file(), document).expect("Failed to write dataset");
        Self { file }
    }

    /// Writes the people/articles dataset.
    pub fn people_and_articles() -> Self {
        Self::write(&people_and_articles_dataset())
    }

    /// Returns the file path.
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}
