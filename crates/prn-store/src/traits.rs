use std::path::Path;

use bytes::Bytes;

use crate::error::{StoreError, StoreResult};

/// One object returned by a listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectEntry {
    /// Full key of the object within the bucket.
    pub key: String,
    /// Opaque entity tag for the object's current content.
    pub etag: String,
}

/// Bucket-scoped object store.
///
/// All implementations must satisfy these invariants:
/// - `get` on an absent key fails with [`StoreError::NotFound`].
/// - `put` overwrites any existing object at the key.
/// - `move_object` leaves exactly one object, at the destination key.
/// - `list` returns entries sorted by key.
/// - All I/O errors are propagated, never silently ignored.
pub trait ObjectStore: Send + Sync {
    /// List objects whose key starts with `prefix`.
    ///
    /// With `delimiter` set, only keys that contain no further delimiter
    /// after the prefix are returned, so a listing of `a/b/` yields the
    /// objects directly inside `a/b/` and nothing nested below it.
    fn list(&self, prefix: &str, delimiter: Option<char>) -> StoreResult<Vec<ObjectEntry>>;

    /// Read the object stored at `key`.
    fn get(&self, key: &str) -> StoreResult<Bytes>;

    /// Write `data` at `key`, replacing any existing object.
    fn put(&self, key: &str, data: Bytes) -> StoreResult<()>;

    /// Move the object at `key` to `new_key` (copy then delete).
    ///
    /// Fails with [`StoreError::NotFound`] if `key` does not exist.
    fn move_object(&self, key: &str, new_key: &str) -> StoreResult<()>;

    /// Delete the object at `key`. Returns `true` if the object existed.
    fn delete(&self, key: &str) -> StoreResult<bool>;

    /// Write the contents of a local file at `key`.
    ///
    /// Default implementation reads the whole file. Backends may override to
    /// stream instead.
    fn put_file(&self, key: &str, path: &Path) -> StoreResult<()> {
        let data = std::fs::read(path)?;
        self.put(key, Bytes::from(data))
    }

    /// Check whether an object exists at `key`.
    fn exists(&self, key: &str) -> StoreResult<bool> {
        match self.get(key) {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Returns `true` if `key` is listed under `prefix` given an optional delimiter.
pub(crate) fn matches_listing(key: &str, prefix: &str, delimiter: Option<char>) -> bool {
    match key.strip_prefix(prefix) {
        None => false,
        Some(rest) => match delimiter {
            Some(d) => !rest.contains(d),
            None => true,
        },
    }
}
