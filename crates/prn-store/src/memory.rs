use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use bytes::Bytes;

use crate::content_etag;
use crate::error::{StoreError, StoreResult};
use crate::traits::{matches_listing, ObjectEntry, ObjectStore};

/// In-memory, `BTreeMap`-based object store.
///
/// Intended for tests and embedding. Objects are held behind a `RwLock` and
/// keyed in sorted order, so listings come out sorted without extra work.
pub struct InMemoryObjectStore {
    objects: RwLock<BTreeMap<String, Bytes>>,
}

impl InMemoryObjectStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return every key in the store, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.objects
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect()
    }

    fn read_map(&self) -> StoreResult<RwLockReadGuard<'_, BTreeMap<String, Bytes>>> {
        self.objects
            .read()
            .map_err(|e| StoreError::Backend(format!("lock poisoned: {e}")))
    }

    fn write_map(&self) -> StoreResult<RwLockWriteGuard<'_, BTreeMap<String, Bytes>>> {
        self.objects
            .write()
            .map_err(|e| StoreError::Backend(format!("lock poisoned: {e}")))
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn list(&self, prefix: &str, delimiter: Option<char>) -> StoreResult<Vec<ObjectEntry>> {
        let map = self.read_map()?;
        Ok(map
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .filter(|(key, _)| matches_listing(key, prefix, delimiter))
            .map(|(key, data)| ObjectEntry {
                key: key.clone(),
                etag: content_etag(data),
            })
            .collect())
    }

    fn get(&self, key: &str) -> StoreResult<Bytes> {
        let map = self.read_map()?;
        map.get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    fn put(&self, key: &str, data: Bytes) -> StoreResult<()> {
        let mut map = self.write_map()?;
        map.insert(key.to_string(), data);
        Ok(())
    }

    fn move_object(&self, key: &str, new_key: &str) -> StoreResult<()> {
        // One write lock covers both halves of the move.
        let mut map = self.write_map()?;
        let data = map
            .remove(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        map.insert(new_key.to_string(), data);
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<bool> {
        let mut map = self.write_map()?;
        Ok(map.remove(key).is_some())
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len();
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &count)
            .finish()
    }
}
