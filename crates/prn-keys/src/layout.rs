//! Key builders and public URL construction.
//!
//! These functions are the only place key strings are assembled. Their
//! output is persisted state, so the shapes here must not change.

use crate::types::{LayerState, Version};

/// Top-level prefix holding one manifest document per event.
pub const MANIFEST_PREFIX: &str = "manifests";
/// Top-level prefix holding every event's layer versions.
pub const EVENTS_PREFIX: &str = "events";
/// File name of the per-event version marker under the pending prefix.
pub const VERSION_MARKER_FILE: &str = "last_known_version.txt";
/// Bucket used when none is configured.
pub const DEFAULT_BUCKET: &str = "planetary-response-network";
/// Host suffix appended to the bucket name in public URLs.
pub const DEFAULT_HOST_SUFFIX: &str = "s3.amazonaws.com";

/// `manifests/`
pub fn manifest_prefix() -> String {
    format!("{MANIFEST_PREFIX}/")
}

/// `manifests/<event>.json`
pub fn manifest_key(event: &str) -> String {
    format!("{MANIFEST_PREFIX}/{event}.json")
}

/// `events/<event>/layers/<state>/`
pub fn layers_prefix(event: &str, state: LayerState) -> String {
    format!("{EVENTS_PREFIX}/{event}/layers/{state}/")
}

/// `events/<event>/layers/<state>/v<N>/`
pub fn version_prefix(event: &str, state: LayerState, version: Version) -> String {
    format!("{}{version}/", layers_prefix(event, state))
}

/// `events/<event>/layers/<state>/v<N>/<file_name>`
pub fn layer_key(event: &str, state: LayerState, version: Version, file_name: &str) -> String {
    format!("{}{file_name}", version_prefix(event, state, version))
}

/// `events/<event>/layers/pending/last_known_version.txt`
pub fn version_marker_key(event: &str) -> String {
    format!(
        "{}{VERSION_MARKER_FILE}",
        layers_prefix(event, LayerState::Pending)
    )
}

/// Builds the public URL of an object in the bucket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicUrls {
    bucket: String,
    host_suffix: String,
}

impl PublicUrls {
    /// URLs for `bucket` on the default host suffix.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            host_suffix: DEFAULT_HOST_SUFFIX.to_string(),
        }
    }

    pub fn with_host_suffix(mut self, host_suffix: impl Into<String>) -> Self {
        self.host_suffix = host_suffix.into();
        self
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// `https://<bucket>.<host_suffix>/<key>`
    pub fn url_for(&self, key: &str) -> String {
        format!("https://{}.{}/{}", self.bucket, self.host_suffix, key)
    }
}

impl Default for PublicUrls {
    fn default() -> Self {
        Self::new(DEFAULT_BUCKET)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_match_layout() {
        let v3 = Version::new(3);
        assert_eq!(manifest_prefix(), "manifests/");
        assert_eq!(manifest_key("flood"), "manifests/flood.json");
        assert_eq!(
            layers_prefix("flood", LayerState::Approved),
            "events/flood/layers/approved/"
        );
        assert_eq!(
            version_prefix("flood", LayerState::Pending, v3),
            "events/flood/layers/pending/v3/"
        );
        assert_eq!(
            layer_key("flood", LayerState::Pending, v3, "roads.csv"),
            "events/flood/layers/pending/v3/roads.csv"
        );
        assert_eq!(
            version_marker_key("flood"),
            "events/flood/layers/pending/last_known_version.txt"
        );
    }

    #[test]
    fn default_url_shape() {
        let urls = PublicUrls::default();
        assert_eq!(
            urls.url_for("manifests/flood.json"),
            "https://planetary-response-network.s3.amazonaws.com/manifests/flood.json"
        );
    }

    #[test]
    fn custom_host_suffix() {
        let urls = PublicUrls::new("maps").with_host_suffix("storage.example.org");
        assert_eq!(urls.bucket(), "maps");
        assert_eq!(urls.url_for("a/b"), "https://maps.storage.example.org/a/b");
    }
}
