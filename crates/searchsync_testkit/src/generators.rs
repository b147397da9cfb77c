//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random records that keep the
//! invariants the synchronizer relies on: type names are non-empty and
//! never contain the default separator.

use proptest::prelude::*;
use searchsync_core::{Attributes, Record, RecordKey, TypeName, Value};

/// Strategy for generating valid type names.
pub fn type_name_strategy() -> impl Strategy<Value = TypeName> {
    prop::string::string_regex("[A-Z][A-Za-z0-9_]{0,23}")
        .expect("Invalid regex")
        .prop_map(TypeName::new)
}

/// Strategy for generating record keys.
///
/// Covers integer keys as well as free-form text, including the separator.
pub fn record_key_strategy() -> impl Strategy<Value = RecordKey> {
    prop_oneof![
        any::<i64>().prop_map(RecordKey::from),
        "[a-zA-Z0-9:_-]{1,16}".prop_map(RecordKey::new),
        "\\PC{1,12}".prop_map(RecordKey::new),
    ]
}

/// Strategy for generating scalar and nested attribute values.
pub fn value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Integer),
        "[a-z ]{0,16}".prop_map(Value::Text),
    ];
    leaf.prop_recursive(2, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::List),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4).prop_map(Value::Map),
        ]
    })
}

/// Strategy for generating attribute maps.
pub fn attributes_strategy() -> impl Strategy<Value = Attributes> {
    prop::collection::btree_map("[a-z_]{1,10}", value_strategy(), 0..6)
}

/// Strategy for generating records of one type.
pub fn record_strategy(type_name: &str) -> impl Strategy<Value = Record> {
    let type_name = TypeName::new(type_name);
    (record_key_strategy(), attributes_strategy()).prop_map(move |(key, attributes)| Record {
        type_name: type_name.clone(),
        key,
        attributes,
    })
}

/// Strategy for generating an attribute map and an edited copy of it.
///
/// The edit sets, changes or drops a few attributes, so the pair has a
/// known, possibly empty, difference.
pub fn edited_attributes_strategy() -> impl Strategy<Value = (Attributes, Attributes)> {
    (
        attributes_strategy(),
        prop::collection::vec(("[a-z_]{1,10}", prop::option::of(value_strategy())), 0..4),
    )
        .prop_map(|(before, edits)| {
            let mut after = before.clone();
            for (name, value) in edits {
                match value {
                    Some(value) => {
                        after.insert(name, value);
                    }
                    None => {
                        after.remove(&name);
                    }
                }
            }
            (before, after)
        })
}
