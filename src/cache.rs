use crate::dns_parser::{Name, QueryClass, QueryType, Question, ResourceRecord};
use log::trace;
use multimap::MultiMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Identifies the records answering one question
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub name: Name,
    pub typ: QueryType,
    pub cls: QueryClass,
}

impl CacheKey {
    pub fn new(name: Name, typ: QueryType, cls: QueryClass) -> CacheKey {
        CacheKey { name, typ, cls }
    }

    pub fn of_record(record: &ResourceRecord) -> CacheKey {
        CacheKey::new(record.name.clone(), record.typ(), record.cls)
    }
}

impl<'a> From<&'a Question> for CacheKey {
    fn from(question: &'a Question) -> CacheKey {
        CacheKey::new(question.qname.clone(), question.qtype, question.qclass)
    }
}

/// Records learned from answer sections, shared between resolutions
///
/// Each key keeps its records in the order they were learned, the newest
/// last. Entries never expire.
#[derive(Debug)]
pub struct Cache {
    entries: RwLock<MultiMap<CacheKey, ResourceRecord>>,
}

impl Default for Cache {
    fn default() -> Cache {
        Cache::new()
    }
}

impl Cache {
    pub fn new() -> Cache {
        Cache {
            entries: RwLock::new(MultiMap::new()),
        }
    }

    /// The most recently learned record for `key`
    pub fn lookup(&self, key: &CacheKey) -> Option<ResourceRecord> {
        self.read()
            .get_vec(key)
            .and_then(|records| records.last())
            .cloned()
    }

    /// Every record held for `key`, newest first
    pub fn lookup_all(&self, key: &CacheKey) -> Vec<ResourceRecord> {
        self.read()
            .get_vec(key)
            .map(|records| records.iter().rev().cloned().collect())
            .unwrap_or_default()
    }

    /// Makes `record` the newest entry for its key
    ///
    /// An older record under the same key with the same data is replaced,
    /// so re-learning a record doesn't grow the cache.
    pub fn insert(&self, record: ResourceRecord) {
        let key = CacheKey::of_record(&record);
        trace!("caching {}", record);

        let mut entries = self.write();
        if let Some(records) = entries.get_vec_mut(&key) {
            records.retain(|cached| cached.data != record.data);
        }
        entries.insert(key, record);
    }

    /// Number of records held over all keys
    pub fn len(&self) -> usize {
        self.read().iter_all().map(|(_, records)| records.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> RwLockReadGuard<MultiMap<CacheKey, ResourceRecord>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<MultiMap<CacheKey, ResourceRecord>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}
