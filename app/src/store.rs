//! JSON-file-backed server store.
//!
//! The whole collection is one JSON array rewritten on every mutation. The
//! write goes through a temp file plus rename so a crash mid-write cannot
//! truncate the store.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tk_types::{ServerRecord, ServerStore, StoreError};
use tracing::debug;

pub struct JsonFileStore {
    path: PathBuf,
    // Serializes rewrites; reads always go to disk.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::backend(e.to_string()))?;
        }
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<ServerRecord>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(Vec::new()),
            Ok(text) => {
                serde_json::from_str(&text).map_err(|e| StoreError::backend(e.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(StoreError::backend(e.to_string())),
        }
    }

    fn save(&self, records: &[ServerRecord]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(records)
            .map_err(|e| StoreError::backend(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| StoreError::backend(e.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|e| StoreError::backend(e.to_string()))?;
        debug!(path = %self.path.display(), count = records.len(), "store saved");
        Ok(())
    }
}

impl ServerStore for JsonFileStore {
    fn list(&self) -> Result<Vec<ServerRecord>, StoreError> {
        let mut records = self.load()?;
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(records)
    }

    fn get(&self, id: &str) -> Result<Option<ServerRecord>, StoreError> {
        Ok(self.load()?.into_iter().find(|r| r.id == id))
    }

    fn put(&self, record: ServerRecord) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        let mut records = self.load()?;
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        self.save(&records)
    }

    fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock();
        let mut records = self.load()?;
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Ok(false);
        }
        self.save(&records)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tk_types::Protocol;

    #[test]
    fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("servers.json");

        let rec = ServerRecord::new(Protocol::Trojan, "t.example", 443);
        let id = rec.id.clone();
        {
            let store = JsonFileStore::open(&path).unwrap();
            store.put(rec).unwrap();
        }
        let store = JsonFileStore::open(&path).unwrap();
        let loaded = store.get(&id).unwrap().unwrap();
        assert_eq!(loaded.address, "t.example");
        assert!(store.delete(&id).unwrap());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn put_updates_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("servers.json")).unwrap();

        let mut rec = ServerRecord::new(Protocol::Vmess, "a.example", 443);
        rec.uuid = Some("u".into());
        store.put(rec.clone()).unwrap();
        rec.latency_ms = 120;
        store.put(rec.clone()).unwrap();

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].latency_ms, 120);
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("nope.json")).unwrap();
        assert!(store.list().unwrap().is_empty());
        assert!(store.get("x").unwrap().is_none());
        assert!(!store.delete("x").unwrap());
    }
}
