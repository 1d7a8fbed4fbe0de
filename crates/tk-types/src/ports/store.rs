//! Server store port.

use crate::errors::StoreError;
use crate::record::ServerRecord;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Durable keyed collection of [`ServerRecord`].
///
/// The store is assumed to provide atomic get/put semantics. Callers that
/// need read-modify-write (favorite toggle, latency update) re-fetch the
/// record before writing it back rather than holding a stale copy.
pub trait ServerStore: Send + Sync {
    fn list(&self) -> Result<Vec<ServerRecord>, StoreError>;
    fn get(&self, id: &str) -> Result<Option<ServerRecord>, StoreError>;
    fn put(&self, record: ServerRecord) -> Result<(), StoreError>;
    fn delete(&self, id: &str) -> Result<bool, StoreError>;
}

/// In-memory store, used by tests and as the default when no persistent
/// backend is injected.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, ServerRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl ServerStore for MemoryStore {
    fn list(&self) -> Result<Vec<ServerRecord>, StoreError> {
        let mut records: Vec<ServerRecord> = self.records.read().values().cloned().collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(records)
    }

    fn get(&self, id: &str) -> Result<Option<ServerRecord>, StoreError> {
        Ok(self.records.read().get(id).cloned())
    }

    fn put(&self, record: ServerRecord) -> Result<(), StoreError> {
        self.records.write().insert(record.id.clone(), record);
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.records.write().remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Protocol;

    #[test]
    fn put_get_delete() {
        let store = MemoryStore::new();
        let rec = ServerRecord::new(Protocol::Vmess, "a.example", 443);
        let id = rec.id.clone();

        store.put(rec).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.get(&id).unwrap().is_some());
        assert!(store.delete(&id).unwrap());
        assert!(!store.delete(&id).unwrap());
        assert!(store.get(&id).unwrap().is_none());
    }

    #[test]
    fn list_is_ordered_by_creation() {
        let store = MemoryStore::new();
        let a = ServerRecord::new(Protocol::Vmess, "a.example", 1);
        let b = ServerRecord::new(Protocol::Vmess, "b.example", 2);
        store.put(b.clone()).unwrap();
        store.put(a.clone()).unwrap();
        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed[0].created_at <= listed[1].created_at);
    }
}
