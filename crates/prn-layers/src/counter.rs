//! Per-event version marker.
//!
//! Each event keeps the last committed version number as plain decimal text
//! under its pending prefix. The counter is read-then-write with no locking:
//! two uploads racing on the same event can observe the same next version.
//! Callers needing stronger guarantees must serialize uploads per event.

use std::sync::Arc;

use bytes::Bytes;
use prn_keys::{layout, Version};
use prn_store::{ObjectStore, StoreError};
use tracing::{debug, warn};

use crate::error::{LayerError, LayerResult};

/// Reads and commits the per-event version marker.
#[derive(Clone)]
pub struct VersionCounter {
    store: Arc<dyn ObjectStore>,
}

impl VersionCounter {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// The last committed version, `0` when no marker exists.
    ///
    /// Surrounding whitespace is ignored. A marker that does not hold a
    /// decimal number is treated as `0`.
    pub fn current_version(&self, event: &str) -> LayerResult<u64> {
        let key = layout::version_marker_key(event);
        let data = match self.store.get(&key) {
            Ok(data) => data,
            Err(StoreError::NotFound(_)) => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let parsed = std::str::from_utf8(&data)
            .ok()
            .and_then(|text| text.trim().parse::<u64>().ok());
        match parsed {
            Some(n) => Ok(n),
            None => {
                warn!(event, key = %key, "unreadable version marker, treating as 0");
                Ok(0)
            }
        }
    }

    /// The version a new upload should use. Does not persist anything.
    ///
    /// Fails when the marker already holds the largest representable version.
    pub fn next_version(&self, event: &str) -> LayerResult<Version> {
        let current = self.current_version(event)?;
        let next = current
            .checked_add(1)
            .map(Version::new)
            .ok_or_else(|| LayerError::VersionOverflow {
                event: event.to_string(),
                current,
            })?;
        debug!(event, version = %next, "next version");
        Ok(next)
    }

    /// Record `version` as the last committed version, overwriting the marker.
    pub fn commit_version(&self, event: &str, version: Version) -> LayerResult<()> {
        let key = layout::version_marker_key(event);
        self.store
            .put(&key, Bytes::from(version.number().to_string()))?;
        debug!(event, version = %version, "version committed");
        Ok(())
    }
}

impl std::fmt::Debug for VersionCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionCounter").finish_non_exhaustive()
    }
}
