use serde::{Deserialize, Serialize};

/// Configuration for the upload gate pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Media type every layer upload must declare.
    pub layer_content_type: String,
    /// Media type the metadata upload must declare.
    pub metadata_content_type: String,
    /// Substring the metadata upload's file name must contain.
    pub metadata_name_marker: String,
    /// Top-level attributes the metadata document must carry.
    pub required_event_keys: Vec<String>,
    /// Attributes every entry of the metadata `layers` array must carry.
    pub required_layer_keys: Vec<String>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            layer_content_type: "text/csv".into(),
            metadata_content_type: "application/json".into(),
            metadata_name_marker: "metadata".into(),
            required_event_keys: vec!["AOI".into(), "created_at".into()],
            required_layer_keys: vec!["file_name".into(), "description".into(), "legend".into()],
        }
    }
}
