//! Dependency resolution.

use crate::blueprint::Blueprint;
use crate::changes::ChangeSet;
use crate::error::{SyncError, SyncResult};
use crate::record::Record;
use tracing::trace;

/// Returns the records that must be reindexed because `record` changed.
///
/// Every rule of `blueprint` whose watched attributes intersect `changes`
/// is invoked with `record`. Results are concatenated in rule declaration
/// order, then in the order each resolver returned them. Duplicates are
/// kept; reindexing the same dependent twice is harmless.
///
/// # Errors
///
/// The first failing resolver aborts resolution with `ResolverFailure`.
pub fn resolve(
    blueprint: &Blueprint,
    record: &Record,
    changes: &ChangeSet,
) -> SyncResult<Vec<Record>> {
    let mut dependents = Vec::new();

    for (index, rule) in blueprint.dependencies().iter().enumerate() {
        if !changes.intersects(rule.watched()) {
            continue;
        }
        let found = rule
            .resolve(record)
            .map_err(|source| SyncError::ResolverFailure {
                type_name: record.type_name().to_string(),
                rule: index,
                source,
            })?;
        trace!(
            type_name = %record.type_name(),
            key = %record.key(),
            rule = index,
            found = found.len(),
            "dependency rule fired"
        );
        dependents.extend(found);
    }

    Ok(dependents)
}
