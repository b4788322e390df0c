//! Classification of object keys.
//!
//! [`ObjectKey::parse`] is total: every string maps to exactly one variant,
//! with anything off-layout landing in [`ObjectKey::Unrecognized`]. Callers
//! enumerating a bucket skip unrecognized keys instead of failing.

use crate::layout::{self, EVENTS_PREFIX, MANIFEST_PREFIX, VERSION_MARKER_FILE};
use crate::types::{LayerState, Version};

/// A key pointing at a file inside a layer version.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerKey {
    pub event: String,
    pub state: LayerState,
    pub version: Version,
    /// Full file name including the extension.
    pub file_name: String,
}

impl LayerKey {
    /// File name without its final extension.
    pub fn base_name(&self) -> &str {
        split_extension(&self.file_name).map_or(self.file_name.as_str(), |(base, _)| base)
    }

    /// Final extension without the dot.
    pub fn extension(&self) -> &str {
        split_extension(&self.file_name).map_or("", |(_, ext)| ext)
    }

    /// The `v<N>` token of this key's version.
    pub fn version_tag(&self) -> String {
        self.version.to_string()
    }

    /// A file is the version's metadata document when its base name
    /// contains `metadata`.
    pub fn is_metadata(&self) -> bool {
        self.base_name().contains("metadata")
    }

    /// Rebuild the full key.
    pub fn key(&self) -> String {
        layout::layer_key(&self.event, self.state, self.version, &self.file_name)
    }

    /// The same file relocated to `state`, keeping version and file name.
    pub fn with_state(&self, state: LayerState) -> Self {
        Self {
            state,
            ..self.clone()
        }
    }
}

/// Every shape a key in the bucket can take.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ObjectKey {
    /// `manifests/<event>.json`
    Manifest { event: String },
    /// `events/<event>/layers/<state>/v<N>/<base>.<ext>`
    Layer(LayerKey),
    /// `events/<event>/layers/pending/last_known_version.txt`
    VersionMarker { event: String },
    /// Anything else.
    Unrecognized,
}

impl ObjectKey {
    pub fn parse(key: &str) -> Self {
        let segments: Vec<&str> = key.split('/').collect();
        match segments.as_slice() {
            [MANIFEST_PREFIX, file] => match file.strip_suffix(".json") {
                Some(event) if !event.is_empty() => Self::Manifest {
                    event: event.to_string(),
                },
                _ => Self::Unrecognized,
            },
            [EVENTS_PREFIX, event, "layers", "pending", VERSION_MARKER_FILE]
                if !event.is_empty() =>
            {
                Self::VersionMarker {
                    event: event.to_string(),
                }
            }
            [EVENTS_PREFIX, event, "layers", state, token, file] if !event.is_empty() => {
                let (Ok(state), Some(version)) =
                    (state.parse::<LayerState>(), Version::from_token(token))
                else {
                    return Self::Unrecognized;
                };
                if split_extension(file).is_none() {
                    return Self::Unrecognized;
                }
                Self::Layer(LayerKey {
                    event: event.to_string(),
                    state,
                    version,
                    file_name: file.to_string(),
                })
            }
            _ => Self::Unrecognized,
        }
    }

    /// The layer key, if this is one.
    pub fn into_layer(self) -> Option<LayerKey> {
        match self {
            Self::Layer(layer) => Some(layer),
            _ => None,
        }
    }
}

/// Split `name` at its last dot into non-empty base and extension.
fn split_extension(name: &str) -> Option<(&str, &str)> {
    let (base, ext) = name.rsplit_once('.')?;
    if base.is_empty() || ext.is_empty() {
        None
    } else {
        Some((base, ext))
    }
}
