//! Indexation policy.
//!
//! [`decide`] is the pure part of the policy engine: given a record, what
//! changed, the type's blueprint, and how the decision was triggered, it
//! says whether the index must be left alone, written, or cleared. The
//! synchronizer applies the result against the indexing engine.
//!
//! | Trigger   | autoindex off | no changes | excluded | otherwise |
//! |-----------|---------------|------------|----------|-----------|
//! | `Update`  | skip          | skip       | remove   | upsert    |
//! | `Destroy` | remove        | remove     | remove   | remove    |
//! | `Rebuild` | (ignored)     | (ignored)  | remove   | upsert    |
//! | `Cascade` | (ignored)     | (ignored)  | remove   | upsert    |

use crate::blueprint::Blueprint;
use crate::changes::ChangeSet;
use crate::record::Record;
use std::fmt;

/// What caused an indexation decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// The record was created or updated.
    Update,
    /// The record was destroyed.
    Destroy,
    /// A full rebuild of the record's type.
    Rebuild,
    /// A dependency rule of another record fired.
    Cascade,
}

/// Why a decision left the index untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The type's autoindex flag is off.
    AutoindexDisabled,
    /// The save changed no attribute.
    NoChanges,
}

/// The outcome of the indexation policy for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    /// Leave the index untouched.
    Skip(SkipReason),
    /// Add or replace the record's document.
    Upsert,
    /// Remove the record's document (idempotent).
    Remove,
}

impl Decision {
    /// Returns true if the decision writes to the indexing engine.
    pub fn touches_index(self) -> bool {
        !matches!(self, Decision::Skip(_))
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Skip(SkipReason::AutoindexDisabled) => f.write_str("skip (autoindex off)"),
            Decision::Skip(SkipReason::NoChanges) => f.write_str("skip (no changes)"),
            Decision::Upsert => f.write_str("upsert"),
            Decision::Remove => f.write_str("remove"),
        }
    }
}

/// Decides how the index must react to `record`.
pub fn decide(
    blueprint: &Blueprint,
    record: &Record,
    changes: &ChangeSet,
    trigger: Trigger,
) -> Decision {
    match trigger {
        Trigger::Destroy => return Decision::Remove,
        Trigger::Update => {
            if !blueprint.is_autoindexed() {
                return Decision::Skip(SkipReason::AutoindexDisabled);
            }
            if changes.is_empty() {
                return Decision::Skip(SkipReason::NoChanges);
            }
        }
        Trigger::Rebuild | Trigger::Cascade => {}
    }

    if blueprint.excludes(record) {
        Decision::Remove
    } else {
        Decision::Upsert
    }
}
