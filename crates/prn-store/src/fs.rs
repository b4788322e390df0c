//! Directory-backed object store.
//!
//! [`FsObjectStore`] treats a local directory as a bucket: every key maps to
//! a file at the same relative path. It lets the service run on a single
//! machine without a cloud bucket and backs the CLI's local commands.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tempfile::NamedTempFile;
use tracing::debug;
use walkdir::WalkDir;

use crate::content_etag;
use crate::error::{StoreError, StoreResult};
use crate::traits::{matches_listing, ObjectEntry, ObjectStore};

/// Prefix `tempfile` gives to in-flight writes; such files are never listed.
const TEMP_PREFIX: &str = ".tmp";

/// An [`ObjectStore`] rooted at a local directory.
#[derive(Clone, Debug)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// The directory acting as the bucket.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a key onto a path below the root, rejecting keys that would escape it.
    fn resolve(&self, key: &str) -> StoreResult<PathBuf> {
        let invalid = |reason: &str| StoreError::InvalidKey {
            key: key.to_string(),
            reason: reason.to_string(),
        };

        if key.is_empty() {
            return Err(invalid("key must not be empty"));
        }
        if key.starts_with('/') {
            return Err(invalid("key must not start with '/'"));
        }
        if key.contains('\\') {
            return Err(invalid("key must not contain '\\'"));
        }

        let mut path = self.root.clone();
        for segment in key.split('/') {
            match segment {
                "" => return Err(invalid("key segments must not be empty")),
                "." | ".." => return Err(invalid("key must not contain relative segments")),
                s => path.push(s),
            }
        }
        Ok(path)
    }

    fn key_for(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let segments: Option<Vec<&str>> =
            rel.components().map(|c| c.as_os_str().to_str()).collect();
        Some(segments?.join("/"))
    }

    /// The directory a listing of `prefix` has to walk, and the walk depth.
    ///
    /// The walk starts at the deepest directory `prefix` names. With a `/`
    /// delimiter only that directory's direct children can match. `None`
    /// when the directory does not exist or `prefix` cannot name a key.
    fn listing_scope(
        &self,
        prefix: &str,
        delimiter: Option<char>,
    ) -> StoreResult<Option<(PathBuf, usize)>> {
        let dir = match prefix.rsplit_once('/') {
            Some((dir, _)) if !dir.is_empty() => match self.resolve(dir) {
                Ok(dir) => dir,
                Err(StoreError::InvalidKey { .. }) => return Ok(None),
                Err(e) => return Err(e),
            },
            _ => self.root.clone(),
        };
        if !dir.is_dir() {
            return Ok(None);
        }
        let depth = if delimiter == Some('/') { 1 } else { usize::MAX };
        Ok(Some((dir, depth)))
    }

    /// Write through a temp file in the destination directory, then persist.
    fn write_atomic(&self, key: &str, mut source: impl io::Read) -> StoreResult<()> {
        let path = self.resolve(key)?;
        let parent = path
            .parent()
            .ok_or_else(|| StoreError::Backend(format!("no parent directory for {key}")))?;
        fs::create_dir_all(parent)?;

        let mut tmp = NamedTempFile::new_in(parent)?;
        io::copy(&mut source, &mut tmp)?;
        tmp.flush()?;
        tmp.persist(&path).map_err(|e| StoreError::Io(e.error))?;
        debug!(key, "object written");
        Ok(())
    }
}

fn not_found_or(key: &str, err: io::Error) -> StoreError {
    if err.kind() == io::ErrorKind::NotFound {
        StoreError::NotFound(key.to_string())
    } else {
        StoreError::Io(err)
    }
}

impl ObjectStore for FsObjectStore {
    fn list(&self, prefix: &str, delimiter: Option<char>) -> StoreResult<Vec<ObjectEntry>> {
        let Some((dir, depth)) = self.listing_scope(prefix, delimiter)? else {
            return Ok(Vec::new());
        };

        let mut entries = Vec::new();
        for entry in WalkDir::new(&dir).max_depth(depth) {
            let entry = entry.map_err(|e| StoreError::Backend(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.file_name().to_string_lossy().starts_with(TEMP_PREFIX) {
                continue;
            }
            let Some(key) = self.key_for(entry.path()) else {
                continue;
            };
            if !matches_listing(&key, prefix, delimiter) {
                continue;
            }
            let data = fs::read(entry.path())?;
            entries.push(ObjectEntry {
                etag: content_etag(&data),
                key,
            });
        }
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }

    fn get(&self, key: &str) -> StoreResult<Bytes> {
        let path = self.resolve(key)?;
        fs::read(&path)
            .map(Bytes::from)
            .map_err(|e| not_found_or(key, e))
    }

    fn put(&self, key: &str, data: Bytes) -> StoreResult<()> {
        self.write_atomic(key, data.as_ref())
    }

    fn put_file(&self, key: &str, path: &Path) -> StoreResult<()> {
        let file = File::open(path)?;
        self.write_atomic(key, file)
    }

    fn move_object(&self, key: &str, new_key: &str) -> StoreResult<()> {
        let from = self.resolve(key)?;
        let to = self.resolve(new_key)?;
        if !from.is_file() {
            return Err(StoreError::NotFound(key.to_string()));
        }
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::rename(&from, &to).map_err(|e| not_found_or(key, e))?;
        debug!(from = key, to = new_key, "object moved");
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<bool> {
        let path = self.resolve(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}
