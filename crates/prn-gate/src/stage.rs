use std::time::Duration;

use bytes::Bytes;
use serde_json::Value;

use crate::config::GateConfig;
use crate::error::{GateError, ValidationIssue};

// ---------------------------------------------------------------------------
// Upload descriptors
// ---------------------------------------------------------------------------

/// One uploaded file as received from the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadFile {
    /// Client-supplied file name, used as the stored object's name.
    pub file_name: String,
    /// Declared media type.
    pub content_type: String,
    /// Full file content.
    pub content: Bytes,
}

impl UploadFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            content: content.into(),
        }
    }
}

/// A batch submitted for one new layer version.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UploadBatch {
    /// The metadata document describing the layer files.
    pub metadata: Option<UploadFile>,
    /// Layer files in upload order.
    pub layers: Vec<UploadFile>,
}

// ---------------------------------------------------------------------------
// StageDecision
// ---------------------------------------------------------------------------

/// The outcome of a single stage evaluation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StageDecision {
    /// The stage passed; proceed to the next stage.
    Pass,
    /// The stage found problems; the batch is rejected.
    Fail { issues: Vec<ValidationIssue> },
}

impl StageDecision {
    /// `Pass` when `issues` is empty, otherwise `Fail`.
    pub fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        if issues.is_empty() {
            Self::Pass
        } else {
            Self::Fail { issues }
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, Self::Fail { .. })
    }

    /// Issues reported by a failing stage; empty on `Pass`.
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            Self::Pass => &[],
            Self::Fail { issues } => issues,
        }
    }
}

// ---------------------------------------------------------------------------
// StageResult
// ---------------------------------------------------------------------------

/// Recorded result from a completed stage evaluation.
#[derive(Clone, Debug)]
pub struct StageResult {
    pub stage_name: String,
    pub passed: bool,
    pub issue_count: usize,
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// UploadContext
// ---------------------------------------------------------------------------

/// State shared by the stages of one evaluation.
pub struct UploadContext<'a> {
    /// Active gate configuration.
    pub config: &'a GateConfig,
    /// The parsed metadata document, set by the parse stage.
    pub metadata: Option<Value>,
}

impl<'a> UploadContext<'a> {
    pub fn new(config: &'a GateConfig) -> Self {
        Self {
            config,
            metadata: None,
        }
    }

    /// A context whose metadata is already parsed, for running later stages alone.
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// The parsed metadata, or a stage error naming the stage that needed it.
    pub fn require_metadata(&self, stage: &str) -> Result<&Value, GateError> {
        self.metadata
            .as_ref()
            .ok_or_else(|| GateError::stage(stage, "metadata document has not been parsed"))
    }
}

// ---------------------------------------------------------------------------
// UploadStage trait
// ---------------------------------------------------------------------------

/// A single evaluation stage in the upload pipeline.
///
/// Stages are evaluated in order. Each receives the batch and the shared
/// context and returns a pass/fail decision. A stage may record derived
/// state (such as the parsed metadata) on the context for later stages.
///
/// The trait is object-safe and `Send + Sync` so stages can be stored in
/// a `Vec<Box<dyn UploadStage>>`.
pub trait UploadStage: Send + Sync {
    /// Human-readable name of this stage (e.g., "presence", "entries").
    fn name(&self) -> &str;

    /// Evaluate the batch and return a decision.
    fn evaluate(
        &self,
        batch: &UploadBatch,
        context: &mut UploadContext<'_>,
    ) -> Result<StageDecision, GateError>;
}

/// The `layers` array of a metadata document; absent or non-array is empty.
pub(crate) fn metadata_entries(metadata: &Value) -> &[Value] {
    metadata
        .get("layers")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// The `file_name` of a metadata entry. Non-string values are rendered as
/// JSON text so they still compare and report consistently.
pub(crate) fn entry_file_name(entry: &Value) -> Option<String> {
    entry.get("file_name").map(|value| match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}
