//! Per-type indexing configuration ("blueprints").
//!
//! A blueprint tells the synchronizer, for one record type:
//!
//! - whether mutation hooks are wired at all (`autoindex`)
//! - which records must be kept out of the index (`exclude`)
//! - which other records depend on this type's attributes (`dependencies`)
//!
//! Blueprints are collected into a [`BlueprintRegistry`] once at startup and
//! treated as immutable while any operation runs.

use crate::error::{BoxError, SyncError, SyncResult};
use crate::record::Record;
use crate::types::TypeName;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

/// Decides whether a record must be kept out of the index.
pub type ExclusionPredicate = Arc<dyn Fn(&Record) -> bool + Send + Sync>;

/// Returns the records that depend on a changed record.
pub type DependencyResolver = Arc<dyn Fn(&Record) -> Result<Vec<Record>, BoxError> + Send + Sync>;

/// Declares that changes to some attributes require reindexing other records.
#[derive(Clone)]
pub struct DependencyRule {
    watched: BTreeSet<String>,
    resolver: DependencyResolver,
}

impl DependencyRule {
    /// Creates a rule watching `attributes`.
    pub fn new<I, S, F>(attributes: I, resolver: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&Record) -> Result<Vec<Record>, BoxError> + Send + Sync + 'static,
    {
        Self {
            watched: attributes.into_iter().map(Into::into).collect(),
            resolver: Arc::new(resolver),
        }
    }

    /// Returns the watched attribute names.
    pub fn watched(&self) -> &BTreeSet<String> {
        &self.watched
    }

    /// Invokes the resolver for a triggering record.
    pub fn resolve(&self, record: &Record) -> Result<Vec<Record>, BoxError> {
        (self.resolver)(record)
    }
}

impl fmt::Debug for DependencyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyRule")
            .field("watched", &self.watched)
            .finish_non_exhaustive()
    }
}

/// Indexing configuration for one record type.
#[derive(Clone)]
pub struct Blueprint {
    autoindex: bool,
    exclude: Option<ExclusionPredicate>,
    dependencies: Vec<DependencyRule>,
}

impl Default for Blueprint {
    fn default() -> Self {
        Self {
            autoindex: true,
            exclude: None,
            dependencies: Vec::new(),
        }
    }
}

impl Blueprint {
    /// Creates a blueprint with autoindexing on and no rules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Turns mutation hooks on or off for the type.
    #[must_use]
    pub fn autoindex(mut self, enabled: bool) -> Self {
        self.autoindex = enabled;
        self
    }

    /// Sets the exclusion predicate.
    #[must_use]
    pub fn exclude_when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Record) -> bool + Send + Sync + 'static,
    {
        self.exclude = Some(Arc::new(predicate));
        self
    }

    /// Appends a dependency rule. Rules fire in declaration order.
    #[must_use]
    pub fn depends_on(mut self, rule: DependencyRule) -> Self {
        self.dependencies.push(rule);
        self
    }

    /// Returns true if mutation hooks should be wired for the type.
    pub fn is_autoindexed(&self) -> bool {
        self.autoindex
    }

    /// Evaluates the exclusion predicate. No predicate means never excluded.
    pub fn excludes(&self, record: &Record) -> bool {
        self.exclude.as_ref().is_some_and(|p| p(record))
    }

    /// Returns the dependency rules in declaration order.
    pub fn dependencies(&self) -> &[DependencyRule] {
        &self.dependencies
    }
}

impl fmt::Debug for Blueprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blueprint")
            .field("autoindex", &self.autoindex)
            .field("has_exclusion", &self.exclude.is_some())
            .field("dependencies", &self.dependencies)
            .finish()
    }
}

/// Registry of blueprints keyed by type name.
///
/// This is also the registry of known types: identities decoding to a type
/// that is not registered here are rejected.
#[derive(Debug, Clone, Default)]
pub struct BlueprintRegistry {
    blueprints: HashMap<TypeName, Blueprint>,
}

impl BlueprintRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the blueprint for a type.
    pub fn register(&mut self, type_name: impl Into<TypeName>, blueprint: Blueprint) -> &mut Self {
        self.blueprints.insert(type_name.into(), blueprint);
        self
    }

    /// Builder-style variant of [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, type_name: impl Into<TypeName>, blueprint: Blueprint) -> Self {
        self.register(type_name, blueprint);
        self
    }

    /// Returns the blueprint for a type.
    ///
    /// # Errors
    ///
    /// Returns `UnknownType` if no blueprint is registered.
    pub fn config_for(&self, type_name: &TypeName) -> SyncResult<&Blueprint> {
        self.blueprints
            .get(type_name)
            .ok_or_else(|| SyncError::unknown_type(type_name.as_str()))
    }

    /// Returns true if the type is registered.
    pub fn contains(&self, type_name: &TypeName) -> bool {
        self.blueprints.contains_key(type_name)
    }

    /// Iterates registered types and their blueprints.
    pub fn iter(&self) -> impl Iterator<Item = (&TypeName, &Blueprint)> {
        self.blueprints.iter()
    }

    /// Returns the registered type names, sorted.
    pub fn type_names(&self) -> Vec<TypeName> {
        let mut names: Vec<_> = self.blueprints.keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns the number of registered types.
    pub fn len(&self) -> usize {
        self.blueprints.len()
    }

    /// Returns true if no type is registered.
    pub fn is_empty(&self) -> bool {
        self.blueprints.is_empty()
    }
}
