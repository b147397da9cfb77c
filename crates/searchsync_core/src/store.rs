//! Record store collaborator.
//!
//! The synchronizer never owns records. It reads them through the
//! [`RecordStore`] trait, which the host's persistence layer implements.
//! [`MemoryRecordStore`] is a complete in-process implementation used by
//! tests, the CLI, and embedders that keep records in memory.

use crate::error::{SyncError, SyncResult};
use crate::record::Record;
use crate::types::{RecordKey, TypeName};
use crate::value::Attributes;
use parking_lot::RwLock;
use std::collections::{BTreeMap, VecDeque};

/// Lazy, finite sequence of records produced by a store.
///
/// Items are fallible: a record listed at the start of an enumeration may
/// be gone by the time it is read, which stores report as
/// `SyncError::RecordNotFound` for that item only.
pub type RecordIter<'a> = Box<dyn Iterator<Item = SyncResult<Record>> + Send + 'a>;

/// Read access to the external record store.
pub trait RecordStore: Send + Sync {
    /// Returns the last persisted attributes of `record`.
    ///
    /// Returns `None` for a record that was never persisted.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn snapshot_of(&self, record: &Record) -> SyncResult<Option<Attributes>>;

    /// Enumerates every record of a type.
    ///
    /// The sequence is lazy and may page internally. Calling this again
    /// restarts the enumeration.
    ///
    /// # Errors
    ///
    /// Returns an error if the enumeration cannot be started.
    fn all_records_of(&self, type_name: &TypeName) -> SyncResult<RecordIter<'_>>;

    /// Loads a record by type and key.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read. A missing record is
    /// `Ok(None)`, not an error.
    fn find(&self, type_name: &TypeName, key: &RecordKey) -> SyncResult<Option<Record>>;

    /// Returns the primary key of a record.
    fn primary_key_of(&self, record: &Record) -> RecordKey {
        record.key().clone()
    }
}

/// Default number of records read per page during enumeration.
pub const DEFAULT_PAGE_SIZE: usize = 500;

type Table = BTreeMap<RecordKey, Attributes>;

/// In-memory record store.
///
/// Records are kept per type in key order. Enumeration snapshots the key
/// list up front and then reads records page by page, so a record deleted
/// mid-enumeration surfaces as a `RecordNotFound` item.
#[derive(Debug)]
pub struct MemoryRecordStore {
    tables: RwLock<BTreeMap<TypeName, Table>>,
    page_size: usize,
}

impl MemoryRecordStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Creates an empty store that enumerates `page_size` records at a time.
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            tables: RwLock::new(BTreeMap::new()),
            page_size: page_size.max(1),
        }
    }

    /// Persists a record, returning its previously persisted attributes.
    pub fn put(&self, record: Record) -> Option<Attributes> {
        let Record {
            type_name,
            key,
            attributes,
        } = record;
        self.tables
            .write()
            .entry(type_name)
            .or_default()
            .insert(key, attributes)
    }

    /// Deletes a record, returning it if it existed.
    pub fn delete(&self, type_name: &TypeName, key: &RecordKey) -> Option<Record> {
        let mut tables = self.tables.write();
        let table = tables.get_mut(type_name)?;
        let attributes = table.remove(key)?;
        Some(Record {
            type_name: type_name.clone(),
            key: key.clone(),
            attributes,
        })
    }

    /// Returns the number of records of a type.
    pub fn count(&self, type_name: &TypeName) -> usize {
        self.tables.read().get(type_name).map_or(0, BTreeMap::len)
    }

    /// Returns the total number of records.
    pub fn len(&self) -> usize {
        self.tables.read().values().map(BTreeMap::len).sum()
    }

    /// Returns true if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_page(&self, type_name: &TypeName, keys: &[RecordKey]) -> Vec<SyncResult<Record>> {
        let tables = self.tables.read();
        let table = tables.get(type_name);
        keys.iter()
            .map(|key| match table.and_then(|t| t.get(key)) {
                Some(attributes) => Ok(Record {
                    type_name: type_name.clone(),
                    key: key.clone(),
                    attributes: attributes.clone(),
                }),
                None => Err(SyncError::record_not_found(type_name.as_str(), key.as_str())),
            })
            .collect()
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for MemoryRecordStore {
    fn snapshot_of(&self, record: &Record) -> SyncResult<Option<Attributes>> {
        Ok(self
            .tables
            .read()
            .get(record.type_name())
            .and_then(|t| t.get(record.key()))
            .cloned())
    }

    fn all_records_of(&self, type_name: &TypeName) -> SyncResult<RecordIter<'_>> {
        let keys: Vec<RecordKey> = self
            .tables
            .read()
            .get(type_name)
            .map(|t| t.keys().cloned().collect())
            .unwrap_or_default();

        Ok(Box::new(PagedRecords {
            store: self,
            type_name: type_name.clone(),
            keys,
            position: 0,
            page: VecDeque::new(),
        }))
    }

    fn find(&self, type_name: &TypeName, key: &RecordKey) -> SyncResult<Option<Record>> {
        Ok(self
            .tables
            .read()
            .get(type_name)
            .and_then(|t| t.get(key))
            .map(|attributes| Record {
                type_name: type_name.clone(),
                key: key.clone(),
                attributes: attributes.clone(),
            }))
    }
}

/// Page-at-a-time iterator over a [`MemoryRecordStore`] table.
struct PagedRecords<'a> {
    store: &'a MemoryRecordStore,
    type_name: TypeName,
    keys: Vec<RecordKey>,
    position: usize,
    page: VecDeque<SyncResult<Record>>,
}

impl Iterator for PagedRecords<'_> {
    type Item = SyncResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.page.is_empty() && self.position < self.keys.len() {
            let end = (self.position + self.store.page_size).min(self.keys.len());
            let page = self
                .store
                .read_page(&self.type_name, &self.keys[self.position..end]);
            self.page.extend(page);
            self.position = end;
        }
        self.page.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(n: i64) -> MemoryRecordStore {
        let store = MemoryRecordStore::with_page_size(2);
        for i in 1..=n {
            store.put(Record::new("Person", i).with("name", format!("P{i}")));
        }
        store
    }

    #[test]
    fn put_returns_prior_attributes() {
        let store = MemoryRecordStore::new();
        assert!(store.put(Record::new("Person", 1i64).with("name", "A")).is_none());
        let prior = store.put(Record::new("Person", 1i64).with("name", "B")).unwrap();
        assert_eq!(prior["name"].as_text(), Some("A"));
    }

    #[test]
    fn snapshot_of_reads_persisted_state() {
        let store = store_with(1);
        let edited = Record::new("Person", 1i64).with("name", "changed");
        let snapshot = store.snapshot_of(&edited).unwrap().unwrap();
        assert_eq!(snapshot["name"].as_text(), Some("P1"));
        assert!(store.snapshot_of(&Record::new("Person", 9i64)).unwrap().is_none());
    }

    #[test]
    fn enumerates_all_records_across_pages() {
        let store = store_with(5);
        let keys: Vec<String> = store
            .all_records_of(&TypeName::new("Person"))
            .unwrap()
            .map(|r| r.unwrap().key().to_string())
            .collect();
        assert_eq!(keys, vec!["1", "2", "3", "4", "5"]);
    }

    #[test]
    fn enumeration_is_restartable() {
        let store = store_with(3);
        let t = TypeName::new("Person");
        assert_eq!(store.all_records_of(&t).unwrap().count(), 3);
        assert_eq!(store.all_records_of(&t).unwrap().count(), 3);
    }

    #[test]
    fn deleted_mid_enumeration_is_reported() {
        let store = store_with(4);
        let t = TypeName::new("Person");
        let mut iter = store.all_records_of(&t).unwrap();

        assert!(iter.next().unwrap().is_ok());
        store.delete(&t, &RecordKey::from(3i64));

        assert!(iter.next().unwrap().is_ok());
        assert!(matches!(iter.next().unwrap(), Err(SyncError::RecordNotFound { .. })));
        assert!(iter.next().unwrap().is_ok());
        assert!(iter.next().is_none());
    }

    #[test]
    fn unknown_type_enumerates_nothing() {
        let store = store_with(2);
        assert_eq!(store.all_records_of(&TypeName::new("Article")).unwrap().count(), 0);
    }

    #[test]
    fn find_and_delete() {
        let store = store_with(2);
        let t = TypeName::new("Person");
        let k = RecordKey::from(2i64);
        assert!(store.find(&t, &k).unwrap().is_some());
        assert!(store.delete(&t, &k).is_some());
        assert!(store.find(&t, &k).unwrap().is_none());
        assert_eq!(store.count(&t), 1);
        assert_eq!(store.primary_key_of(&Record::new("Person", 7i64)).as_str(), "7");
    }
}
