//! Bucket-scoped object storage for PRN Maps.
//!
//! Everything the layer service persists -- event manifests, layer files,
//! metadata documents and version markers -- lives as an object in a single
//! bucket, addressed by a `/`-separated key. This crate defines the capability
//! the rest of the workspace depends on and ships two backends.
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait:
//!
//! - [`InMemoryObjectStore`] -- `BTreeMap`-based store for tests and embedding
//! - [`FsObjectStore`] -- a local directory standing in for a bucket
//!
//! # Design Rules
//!
//! 1. Keys are opaque to the store; layout conventions belong to `prn-keys`.
//! 2. `get` and `move_object` report a missing key as [`StoreError::NotFound`],
//!    distinct from every transport failure.
//! 3. A move is copy-then-delete and appears atomic to a single caller.
//! 4. Listings are returned sorted by key.
//! 5. The store never retries; failures propagate to the caller.

pub mod error;
pub mod fs;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FsObjectStore;
pub use memory::InMemoryObjectStore;
pub use traits::{ObjectEntry, ObjectStore};

/// Compute the entity tag reported for an object body.
pub fn content_etag(data: &[u8]) -> String {
    blake3::hash(data).to_hex().as_str()[..32].to_string()
}
