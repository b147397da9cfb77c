//! Change tracking between a record's persisted and current state.

use crate::value::Attributes;
use std::collections::btree_set::{self, BTreeSet};
use std::fmt;

/// The set of attribute names that changed in a mutation.
///
/// An empty change set means the save was a no-op; the update path uses
/// that as the signal to skip all indexing work.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ChangeSet(BTreeSet<String>);

impl ChangeSet {
    /// Creates an empty change set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a change set naming every attribute of `attributes`.
    pub fn all_of(attributes: &Attributes) -> Self {
        attributes.keys().cloned().collect()
    }

    /// Adds an attribute name.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.0.insert(name.into())
    }

    /// Returns true if no attribute changed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of changed attributes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the named attribute changed.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    /// Returns true if any of `names` changed.
    pub fn intersects<'a, I>(&self, names: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        names.into_iter().any(|n| self.0.contains(n.as_str()))
    }

    /// Iterates changed attribute names in sorted order.
    pub fn iter(&self) -> btree_set::Iter<'_, String> {
        self.0.iter()
    }
}

impl fmt::Display for ChangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, name) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(name)?;
        }
        f.write_str("}")
    }
}

impl<S: Into<String>> FromIterator<S> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a String;
    type IntoIter = btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Computes which attributes changed since the record was last persisted.
///
/// `prior` is `None` for a record that was never persisted; every current
/// attribute then counts as changed. Otherwise an attribute is reported
/// when its value differs, or when it exists on only one side.
pub fn changed_attributes(prior: Option<&Attributes>, current: &Attributes) -> ChangeSet {
    let Some(prior) = prior else {
        return ChangeSet::all_of(current);
    };

    let mut changes = ChangeSet::new();
    for (name, value) in current {
        if prior.get(name) != Some(value) {
            changes.insert(name.clone());
        }
    }
    for name in prior.keys() {
        if !current.contains_key(name) {
            changes.insert(name.clone());
        }
    }
    changes
}
