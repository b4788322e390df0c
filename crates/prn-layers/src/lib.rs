//! Layer versioning for PRN Maps.
//!
//! Ties the store, key layout, and upload gate together into the operations
//! the HTTP edge and CLI expose:
//!
//! - [`LayerRepository::list_events`] / [`LayerRepository::event_manifest`]
//! - [`LayerRepository::list_layers`] / [`LayerRepository::find_layer`]
//! - [`LayerRepository::approve`] / [`LayerRepository::revert`]
//! - [`LayerRepository::upload_batch`]
//!
//! Version numbers come from a [`VersionCounter`] marker per event.

pub mod counter;
pub mod error;
pub mod repository;
pub mod types;

pub use counter::VersionCounter;
pub use error::{LayerError, LayerResult};
pub use repository::{LayerRepository, MANIFEST_NOT_FOUND};
pub use types::{EventSummary, LayerLink, UploadReceipt, VersionView};

// Re-export key types
pub use prn_gate::{UploadBatch, UploadFile, ValidationFailure};
pub use prn_keys::{LayerState, PublicUrls, Version};
pub use prn_store::{FsObjectStore, InMemoryObjectStore, ObjectStore};
