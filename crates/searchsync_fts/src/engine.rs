//! In-memory full-text engine.
//!
//! `FtsEngine` keeps:
//! - Inverted index: token → set of document ids
//! - Forward index: document id → type, tokens, last change tag (for updates)
//!
//! Queries are token based: exact token (AND over all query tokens), any
//! token (OR), and prefix. There is no ranking; hits come back sorted by
//! document id.

use crate::tokenizer::{Tokenizer, TokenizerConfig};
use parking_lot::RwLock;
use searchsync_core::{
    ChangeSet, DocumentId, IndexingEngine, Record, SyncError, SyncResult, TypeName,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::trace;

/// A stored document.
#[derive(Debug, Clone)]
struct Entry {
    type_name: TypeName,
    tokens: HashSet<String>,
    changes: ChangeSet,
}

#[derive(Debug, Default)]
struct Inner {
    inverted: HashMap<String, HashSet<DocumentId>>,
    forward: HashMap<DocumentId, Entry>,
}

impl Inner {
    fn remove(&mut self, document: &DocumentId) -> bool {
        let Some(entry) = self.forward.remove(document) else {
            return false;
        };
        for token in &entry.tokens {
            if let Some(documents) = self.inverted.get_mut(token) {
                documents.remove(document);
                if documents.is_empty() {
                    self.inverted.remove(token);
                }
            }
        }
        true
    }

    fn insert(&mut self, document: DocumentId, entry: Entry) {
        for token in &entry.tokens {
            self.inverted
                .entry(token.clone())
                .or_default()
                .insert(document.clone());
        }
        self.forward.insert(document, entry);
    }

    fn filter_type(&self, hits: HashSet<DocumentId>, type_name: &TypeName) -> Vec<DocumentId> {
        let mut hits: Vec<DocumentId> = hits
            .into_iter()
            .filter(|d| {
                self.forward
                    .get(d)
                    .is_some_and(|e| &e.type_name == type_name)
            })
            .collect();
        hits.sort();
        hits
    }
}

/// In-memory full-text indexing engine.
///
/// # Example
///
/// ```rust
/// use searchsync_core::{ChangeSet, DocumentId, IndexingEngine, Record, TypeName};
/// use searchsync_fts::FtsEngine;
///
/// let engine = FtsEngine::new();
/// let person = Record::new("Person", 1i64).with("name", "Kogler");
/// engine
///     .upsert(&DocumentId::new("Person-1"), &person, &ChangeSet::from_iter(["name"]))
///     .unwrap();
///
/// let hits = engine.search(&TypeName::new("Person"), "kogler").unwrap();
/// assert_eq!(hits, vec![DocumentId::new("Person-1")]);
/// ```
pub struct FtsEngine {
    tokenizer: Tokenizer,
    /// Attributes indexed per type; types not listed index every text attribute.
    fields: HashMap<TypeName, Vec<String>>,
    inner: RwLock<Inner>,
    online: AtomicBool,
}

impl FtsEngine {
    /// Creates an engine with the default tokenizer.
    pub fn new() -> Self {
        Self::with_tokenizer(TokenizerConfig::default())
    }

    /// Creates an engine with a custom tokenizer configuration.
    pub fn with_tokenizer(config: TokenizerConfig) -> Self {
        Self {
            tokenizer: Tokenizer::new(config),
            fields: HashMap::new(),
            inner: RwLock::new(Inner::default()),
            online: AtomicBool::new(true),
        }
    }

    /// Restricts the attributes indexed for a type.
    #[must_use]
    pub fn with_fields<I, S>(mut self, type_name: impl Into<TypeName>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields
            .insert(type_name.into(), fields.into_iter().map(Into::into).collect());
        self
    }

    /// Simulates the engine going offline or coming back.
    ///
    /// While offline every call fails with `EngineUnavailable`.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> SyncResult<()> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(SyncError::engine_unavailable("full-text engine is offline"))
        }
    }

    /// Collects the tokens of the indexed attributes of a record.
    fn tokens_for(&self, record: &Record) -> HashSet<String> {
        let mut tokens = HashSet::new();
        let mut add = |text: &str| tokens.extend(self.tokenizer.tokenize(text));

        match self.fields.get(record.type_name()) {
            Some(fields) => {
                for field in fields {
                    if let Some(value) = record.attribute(field) {
                        value.for_each_text(&mut add);
                    }
                }
            }
            None => {
                for value in record.attributes().values() {
                    value.for_each_text(&mut add);
                }
            }
        }
        tokens
    }

    /// Returns the number of stored documents.
    pub fn document_count(&self) -> usize {
        self.inner.read().forward.len()
    }

    /// Returns the number of stored documents of a type.
    pub fn document_count_for(&self, type_name: &TypeName) -> usize {
        self.inner
            .read()
            .forward
            .values()
            .filter(|e| &e.type_name == type_name)
            .count()
    }

    /// Returns true if the document is stored.
    pub fn contains(&self, document: &DocumentId) -> bool {
        self.inner.read().forward.contains_key(document)
    }

    /// Returns the number of unique tokens.
    pub fn unique_token_count(&self) -> usize {
        self.inner.read().inverted.len()
    }

    /// Returns the change tag carried by the document's last upsert.
    pub fn last_changes(&self, document: &DocumentId) -> Option<ChangeSet> {
        self.inner
            .read()
            .forward
            .get(document)
            .map(|e| e.changes.clone())
    }

    /// Returns the stored tokens of a document, sorted.
    pub fn tokens_of(&self, document: &DocumentId) -> Option<Vec<String>> {
        self.inner.read().forward.get(document).map(|e| {
            let mut tokens: Vec<String> = e.tokens.iter().cloned().collect();
            tokens.sort();
            tokens
        })
    }

    /// Drops every document.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.inverted.clear();
        inner.forward.clear();
    }

    /// Returns documents of a type containing any query token (OR).
    ///
    /// # Errors
    ///
    /// Returns `EngineUnavailable` while offline.
    pub fn search_any(&self, type_name: &TypeName, query: &str) -> SyncResult<Vec<DocumentId>> {
        self.ensure_online()?;
        let inner = self.inner.read();
        let mut hits = HashSet::new();
        for token in self.tokenizer.tokenize(query) {
            if let Some(documents) = inner.inverted.get(&token) {
                hits.extend(documents.iter().cloned());
            }
        }
        Ok(inner.filter_type(hits, type_name))
    }

    /// Returns documents of a type containing a token starting with `prefix`.
    ///
    /// # Errors
    ///
    /// Returns `EngineUnavailable` while offline.
    pub fn search_prefix(&self, type_name: &TypeName, prefix: &str) -> SyncResult<Vec<DocumentId>> {
        self.ensure_online()?;
        let normalized = self.tokenizer.normalize(prefix);
        let inner = self.inner.read();
        let mut hits = HashSet::new();
        for (token, documents) in &inner.inverted {
            if token.starts_with(&normalized) {
                hits.extend(documents.iter().cloned());
            }
        }
        Ok(inner.filter_type(hits, type_name))
    }
}

impl Default for FtsEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexingEngine for FtsEngine {
    fn upsert(&self, document: &DocumentId, record: &Record, changes: &ChangeSet) -> SyncResult<()> {
        self.ensure_online()?;
        let tokens = self.tokens_for(record);
        trace!(document = %document, tokens = tokens.len(), "fts upsert");

        let mut inner = self.inner.write();
        inner.remove(document);
        inner.insert(
            document.clone(),
            Entry {
                type_name: record.type_name().clone(),
                tokens,
                changes: changes.clone(),
            },
        );
        Ok(())
    }

    fn remove(&self, document: &DocumentId) -> SyncResult<()> {
        self.ensure_online()?;
        let removed = self.inner.write().remove(document);
        trace!(document = %document, removed, "fts remove");
        Ok(())
    }

    /// AND semantics: every query token must match.
    fn search(&self, type_name: &TypeName, query: &str) -> SyncResult<Vec<DocumentId>> {
        self.ensure_online()?;
        let tokens = self.tokenizer.tokenize(query);
        let Some((first, rest)) = tokens.split_first() else {
            return Ok(Vec::new());
        };

        let inner = self.inner.read();
        let Some(initial) = inner.inverted.get(first) else {
            return Ok(Vec::new());
        };
        let mut hits = initial.clone();
        for token in rest {
            match inner.inverted.get(token) {
                Some(documents) => hits.retain(|d| documents.contains(d)),
                None => return Ok(Vec::new()),
            }
            if hits.is_empty() {
                break;
            }
        }
        Ok(inner.filter_type(hits, type_name))
    }
}

impl std::fmt::Debug for FtsEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FtsEngine")
            .field("documents", &self.document_count())
            .field("unique_tokens", &self.unique_token_count())
            .finish_non_exhaustive()
    }
}
