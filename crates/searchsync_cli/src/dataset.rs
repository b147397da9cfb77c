//! Dataset files.
//!
//! A dataset bundles declarative blueprints with the records to load:
//!
//! ```json
//! {
//!   "blueprints": {
//!     "Person": {
//!       "exclude_when": { "attribute": "deleted", "equals": true },
//!       "dependencies": [
//!         { "watch": ["name"], "target_type": "Article", "foreign_key": "author_id" }
//!       ]
//!     },
//!     "Article": {}
//!   },
//!   "records": [
//!     { "type": "Person", "key": "1", "attributes": { "name": "Kogler" } }
//!   ]
//! }
//! ```
//!
//! Record keys may be written as strings or as integers.

use crate::error::{CliError, CliResult};
use searchsync_core::{
    Blueprint, BlueprintRegistry, BoxError, DependencyRule, IdentityCodec, MemoryRecordStore,
    Record, RecordKey, RecordStore, SyncConfig, TypeName, Value,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Declarative exclusion: excluded while `attribute` equals `equals`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExcludeWhen {
    /// Attribute to compare.
    pub attribute: String,
    /// Value that excludes the record.
    pub equals: Value,
}

/// Declarative dependency rule.
///
/// When a watched attribute changes, every `target_type` record whose
/// `foreign_key` attribute holds the source record's key is reindexed.
#[derive(Debug, Clone, Deserialize)]
pub struct DependencySpec {
    /// Watched attributes of the source type.
    pub watch: Vec<String>,
    /// Type of the dependent records.
    pub target_type: TypeName,
    /// Attribute of the dependent records that references the source key.
    pub foreign_key: String,
}

/// Declarative blueprint.
#[derive(Debug, Clone, Deserialize)]
pub struct BlueprintSpec {
    /// Whether hooks are wired for the type.
    #[serde(default = "default_autoindex")]
    pub autoindex: bool,
    /// Optional exclusion.
    #[serde(default)]
    pub exclude_when: Option<ExcludeWhen>,
    /// Dependency rules.
    #[serde(default)]
    pub dependencies: Vec<DependencySpec>,
}

fn default_autoindex() -> bool {
    true
}

/// A parsed dataset file.
#[derive(Debug, Clone, Deserialize)]
pub struct Dataset {
    /// Blueprints by type name.
    #[serde(default)]
    pub blueprints: BTreeMap<TypeName, BlueprintSpec>,
    /// Records to load.
    #[serde(default)]
    pub records: Vec<Record>,
}

impl Dataset {
    /// Reads and parses a dataset file.
    pub fn load(path: &Path) -> CliResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| CliError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads every record into a fresh in-memory store.
    pub fn to_store(&self) -> MemoryRecordStore {
        let store = MemoryRecordStore::new();
        for record in &self.records {
            store.put(record.clone());
        }
        store
    }

    /// Compiles the declarative blueprints into a registry.
    ///
    /// Dependency resolvers query `store`.
    pub fn blueprints(&self, store: &Arc<MemoryRecordStore>) -> BlueprintRegistry {
        let mut registry = BlueprintRegistry::new();
        for (type_name, declared) in &self.blueprints {
            registry.register(type_name.clone(), compile(declared, store));
        }
        registry
    }

    /// Lists consistency problems, in a stable order.
    pub fn problems(&self, config: &SyncConfig) -> Vec<String> {
        let codec = config.codec();
        let mut problems = Vec::new();

        for (type_name, declared) in &self.blueprints {
            if let Err(err) = codec.encode(type_name, &RecordKey::new("0")) {
                problems.push(format!("blueprint {type_name}: {err}"));
            }
            for (index, dependency) in declared.dependencies.iter().enumerate() {
                if !self.blueprints.contains_key(&dependency.target_type) {
                    problems.push(format!(
                        "blueprint {type_name}: dependency {index} targets unknown type {}",
                        dependency.target_type
                    ));
                }
                if dependency.watch.is_empty() {
                    problems.push(format!(
                        "blueprint {type_name}: dependency {index} watches no attribute"
                    ));
                }
            }
        }

        for record in &self.records {
            if !self.blueprints.contains_key(record.type_name()) {
                problems.push(format!(
                    "record {} {}: type has no blueprint",
                    record.type_name(),
                    record.key()
                ));
            }
        }
        problems
    }
}

fn compile(declared: &BlueprintSpec, store: &Arc<MemoryRecordStore>) -> Blueprint {
    let mut blueprint = Blueprint::new().autoindex(declared.autoindex);

    if let Some(ExcludeWhen { attribute, equals }) = declared.exclude_when.clone() {
        blueprint = blueprint.exclude_when(move |r| r.attribute(&attribute) == Some(&equals));
    }

    for dependency in &declared.dependencies {
        let store = Arc::clone(store);
        let target = dependency.target_type.clone();
        let foreign_key = dependency.foreign_key.clone();
        blueprint = blueprint.depends_on(DependencyRule::new(
            dependency.watch.iter().cloned(),
            move |source: &Record| -> Result<Vec<Record>, BoxError> {
                referencing(store.as_ref(), &target, &foreign_key, source.key())
            },
        ));
    }
    blueprint
}

/// Returns the records of `target` whose `foreign_key` holds `key`.
fn referencing(
    store: &dyn RecordStore,
    target: &TypeName,
    foreign_key: &str,
    key: &RecordKey,
) -> Result<Vec<Record>, BoxError> {
    let mut found = Vec::new();
    for item in store.all_records_of(target)? {
        let record = item?;
        if record
            .attribute(foreign_key)
            .and_then(key_form)
            .is_some_and(|k| k == *key)
        {
            found.push(record);
        }
    }
    Ok(found)
}

/// Interprets an attribute value as a record key.
fn key_form(value: &Value) -> Option<RecordKey> {
    match value {
        Value::Text(s) => Some(RecordKey::new(s.as_str())),
        Value::Integer(i) => Some(RecordKey::from(*i)),
        _ => None,
    }
}
