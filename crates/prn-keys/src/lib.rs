//! Object key layout for PRN Maps.
//!
//! Every piece of persisted state is addressed by a key of a fixed shape.
//! This crate owns that layout in both directions: builders that produce
//! keys and a single parser that classifies an arbitrary key.
//!
//! # Layout
//!
//! ```text
//! manifests/<event>.json
//! events/<event>/layers/pending/v<N>/<file>
//! events/<event>/layers/approved/v<N>/<file>
//! events/<event>/layers/pending/last_known_version.txt
//! ```
//!
//! # Modules
//!
//! - [`error`] — Error types for names, states, and versions
//! - [`types`] — [`LayerState`] and [`Version`]
//! - [`key`] — [`ObjectKey::parse`] and [`LayerKey`]
//! - [`layout`] — Key builders and [`PublicUrls`]
//! - [`names`] — Event and file name validation

pub mod error;
pub mod key;
pub mod layout;
pub mod names;
pub mod types;

pub use error::{KeyError, Result};
pub use key::{LayerKey, ObjectKey};
pub use layout::PublicUrls;
pub use names::{validate_event_name, validate_file_name};
pub use types::{LayerState, Version};
