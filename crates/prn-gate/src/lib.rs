//! Upload validation pipeline for PRN Maps.
//!
//! Every upload batch -- one metadata document plus one or more layer
//! files -- must pass through the gate before anything is written to the
//! store. The gate runs an ordered pipeline of stages and stops at the
//! first stage that reports problems, so later stages can rely on the
//! preconditions established by earlier ones.
//!
//! # Default pipeline
//!
//! 1. [`PresenceStage`] -- a metadata file and at least one layer file
//! 2. [`FileTypeStage`] -- declared media types and the metadata file name
//! 3. [`ParseStage`] -- the metadata document is a JSON object
//! 4. [`CountStage`] -- one unique metadata entry per uploaded layer file
//! 5. [`EventKeysStage`] -- required top-level attributes
//! 6. [`EntriesStage`] -- required per-layer attributes and file correlation
//!
//! # Quick Start
//!
//! ```rust
//! use bytes::Bytes;
//! use prn_gate::{GateConfig, UploadBatch, UploadFile, UploadGate};
//!
//! let gate = UploadGate::with_default_stages(GateConfig::default());
//! let batch = UploadBatch {
//!     metadata: Some(UploadFile::new(
//!         "roads_metadata.json",
//!         "application/json",
//!         Bytes::from_static(br#"{
//!             "AOI": "lat/lon box",
//!             "created_at": "2017-09-20",
//!             "layers": [{"file_name": "roads.csv", "description": "Roads", "legend": "red"}]
//!         }"#),
//!     )),
//!     layers: vec![UploadFile::new("roads.csv", "text/csv", Bytes::from_static(b"lat,lon\n"))],
//! };
//! let result = gate.evaluate(&batch).unwrap();
//! assert!(result.is_accepted());
//! ```

pub mod config;
pub mod error;
pub mod gate;
pub mod stage;
pub mod stages;

// Re-exports for convenience.
pub use config::GateConfig;
pub use error::{GateError, IssueFamily, ValidationFailure, ValidationIssue};
pub use gate::{Decision, GateResult, UploadGate};
pub use stage::{StageDecision, StageResult, UploadBatch, UploadContext, UploadFile, UploadStage};
pub use stages::{
    CountStage, EntriesStage, EventKeysStage, FileTypeStage, ParseStage, PresenceStage,
};
