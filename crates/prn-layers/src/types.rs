//! Response shapes returned by the repository.

use prn_keys::Version;
use serde::{Deserialize, Serialize};

/// A named object and its public URL.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerLink {
    pub name: String,
    pub url: String,
}

/// An event discovered from its manifest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSummary {
    pub name: String,
    pub url: String,
}

/// One layer version as listed to clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionView {
    pub version: Version,
    /// URL of the version's metadata document, if one was stored.
    pub metadata_url: Option<String>,
    pub layers: Vec<LayerLink>,
}

/// What an accepted upload batch stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub version: Version,
    /// Stored layer file names in upload order.
    pub layers: Vec<String>,
    /// Stored metadata file name.
    pub metadata: String,
}
