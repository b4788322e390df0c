use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::debug;

use crate::config::GateConfig;
use crate::error::{GateError, ValidationFailure};
use crate::stage::{StageDecision, StageResult, UploadBatch, UploadContext, UploadStage};
use crate::stages::{
    CountStage, EntriesStage, EventKeysStage, FileTypeStage, ParseStage, PresenceStage,
};

// ---------------------------------------------------------------------------
// GateResult
// ---------------------------------------------------------------------------

/// Final decision of the pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    Accepted,
    Rejected(ValidationFailure),
}

/// The outcome of running a batch through the full gate pipeline.
#[derive(Clone, Debug)]
pub struct GateResult {
    pub decision: Decision,
    /// The parsed metadata document, when the parse stage ran successfully.
    pub metadata: Option<Value>,
    /// Per-stage results in evaluation order.
    pub stage_results: Vec<StageResult>,
    /// Total wall-clock time for the pipeline evaluation.
    pub elapsed: Duration,
}

impl GateResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self.decision, Decision::Accepted)
    }

    /// The rejection, if the batch was rejected.
    pub fn failure(&self) -> Option<&ValidationFailure> {
        match &self.decision {
            Decision::Accepted => None,
            Decision::Rejected(failure) => Some(failure),
        }
    }
}

// ---------------------------------------------------------------------------
// UploadGate
// ---------------------------------------------------------------------------

/// The upload gate: a configurable pipeline of stages that every batch must
/// pass before any of its files are written.
pub struct UploadGate {
    stages: Vec<Box<dyn UploadStage>>,
    config: GateConfig,
}

impl UploadGate {
    /// Create a new gate with an empty pipeline.
    pub fn new(config: GateConfig) -> Self {
        Self {
            stages: Vec::new(),
            config,
        }
    }

    /// Create a gate with the default stage pipeline:
    /// Presence -> FileType -> Parse -> Count -> EventKeys -> Entries
    pub fn with_default_stages(config: GateConfig) -> Self {
        let mut gate = Self::new(config);
        gate.add_stage(Box::new(PresenceStage));
        gate.add_stage(Box::new(FileTypeStage));
        gate.add_stage(Box::new(ParseStage));
        gate.add_stage(Box::new(CountStage));
        gate.add_stage(Box::new(EventKeysStage));
        gate.add_stage(Box::new(EntriesStage));
        gate
    }

    /// Append a stage to the end of the pipeline.
    pub fn add_stage(&mut self, stage: Box<dyn UploadStage>) {
        self.stages.push(stage);
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Evaluate a batch through the full pipeline.
    ///
    /// The pipeline is **fail-fast**: the first stage that reports issues
    /// stops evaluation and produces a `Rejected` decision carrying exactly
    /// that stage's issues. If all stages pass the decision is `Accepted`.
    pub fn evaluate(&self, batch: &UploadBatch) -> Result<GateResult, GateError> {
        let pipeline_start = Instant::now();
        let mut context = UploadContext::new(&self.config);
        let mut stage_results = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            let stage_start = Instant::now();
            let decision = stage.evaluate(batch, &mut context)?;
            let result = StageResult {
                stage_name: stage.name().to_string(),
                passed: decision.is_pass(),
                issue_count: decision.issues().len(),
                elapsed: stage_start.elapsed(),
            };
            debug!(
                stage = %result.stage_name,
                passed = result.passed,
                issues = result.issue_count,
                elapsed = ?result.elapsed,
                "upload stage evaluated"
            );

            stage_results.push(result);

            if let StageDecision::Fail { issues } = decision {
                return Ok(GateResult {
                    decision: Decision::Rejected(ValidationFailure::new(stage.name(), issues)),
                    metadata: context.metadata,
                    stage_results,
                    elapsed: pipeline_start.elapsed(),
                });
            }
        }

        Ok(GateResult {
            decision: Decision::Accepted,
            metadata: context.metadata,
            stage_results,
            elapsed: pipeline_start.elapsed(),
        })
    }

    /// Evaluate and turn a rejection into [`GateError::Rejected`].
    pub fn validate(&self, batch: &UploadBatch) -> Result<GateResult, GateError> {
        let result = self.evaluate(batch)?;
        match result.decision {
            Decision::Accepted => Ok(result),
            Decision::Rejected(failure) => Err(GateError::Rejected(failure)),
        }
    }
}

impl Default for UploadGate {
    fn default() -> Self {
        Self::with_default_stages(GateConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use serde_json::json;

    use super::*;
    use crate::error::{IssueFamily, ValidationIssue};
    use crate::stage::UploadFile;
    use crate::stages::fixtures::*;

    fn rejected(batch: &UploadBatch) -> ValidationFailure {
        let result = UploadGate::default().evaluate(batch).unwrap();
        result.failure().cloned().expect("batch should be rejected")
    }

    #[test]
    fn default_pipeline_has_six_stages() {
        assert_eq!(UploadGate::default().stage_count(), 6);
        assert_eq!(UploadGate::new(GateConfig::default()).stage_count(), 0);
    }

    #[test]
    fn accepts_one_layer() {
        let batch = batch(&document(vec![entry("layer_1.csv")]), &["layer_1.csv"]);
        let result = UploadGate::default().evaluate(&batch).unwrap();
        assert!(result.is_accepted());
        assert_eq!(result.stage_results.len(), 6);
        assert!(result.stage_results.iter().all(|r| r.passed));
        assert!(result.metadata.is_some());
    }

    #[test]
    fn accepts_multiple_layers() {
        let batch = batch(
            &document(vec![entry("layer_1.csv"), entry("layer_2.csv")]),
            &["layer_1.csv", "layer_2.csv"],
        );
        assert!(UploadGate::default().validate(&batch).is_ok());
    }

    #[test]
    fn empty_payload_stops_at_presence() {
        let failure = rejected(&UploadBatch::default());
        assert_eq!(failure.stage, "presence");
        assert_eq!(
            failure.messages(),
            vec![
                "Missing files - You must specify a metadata file",
                "Missing files - You must specify at least one layer file",
            ]
        );
    }

    #[test]
    fn wrong_type_stops_before_parsing() {
        let mut batch = batch(&document(vec![entry("a.csv")]), &["a.csv"]);
        batch.metadata = Some(UploadFile::new(
            "a_metadata.json",
            "text/csv",
            Bytes::from_static(b"not json"),
        ));
        let failure = rejected(&batch);
        assert_eq!(failure.stage, "file_type");
        assert_eq!(failure.family(), IssueFamily::InvalidFileType);
    }

    #[test]
    fn csv_as_metadata_is_malformed() {
        let batch = UploadBatch {
            metadata: Some(UploadFile::new(
                "layer_1_metadata.json",
                "application/json",
                Bytes::from_static(b"lat,lon\n1,2\n"),
            )),
            layers: vec![csv("layer_1.csv")],
        };
        let failure = rejected(&batch);
        assert_eq!(
            failure.messages(),
            vec!["Invalid metadata - please lint your JSON file"]
        );
    }

    #[test]
    fn count_mismatch_rejected() {
        let batch = batch(
            &document(vec![entry("layer_1.csv"), entry("layer_2.csv")]),
            &["layer_1.csv"],
        );
        assert_eq!(
            rejected(&batch).messages(),
            vec!["Invalid metadata - number of entries does not match the number of uploaded files"]
        );
    }

    #[test]
    fn duplicate_entries_rejected() {
        let batch = batch(
            &document(vec![entry("layer_1.csv"), entry("layer_1.csv")]),
            &["layer_1.csv", "layer_1.csv"],
        );
        assert_eq!(
            rejected(&batch).messages(),
            vec!["Invalid metadata - file contains non unique entries"]
        );
    }

    #[test]
    fn event_keys_checked_before_entries() {
        let doc = json!({
            "AOI": "x",
            "layers": [{"file_name": "missing.csv"}],
        });
        let failure = rejected(&batch(&doc, &["layer_1.csv"]));
        assert_eq!(failure.stage, "event_keys");
        assert_eq!(
            failure.issues,
            vec![ValidationIssue::MissingEventKey {
                key: "created_at".into()
            }]
        );
    }

    #[test]
    fn entry_problems_surface_together() {
        let doc = document(vec![json!({"file_name": "incorret_layer.csv"})]);
        let failure = rejected(&batch(&doc, &["layer_1.csv"]));
        assert_eq!(failure.stage, "entries");
        assert_eq!(
            failure.messages(),
            vec![
                "Invalid metadata - Layer: 0 missing attributes: description,legend",
                "Invalid metadata - Layer: 0 lists missing layer file: incorret_layer.csv",
            ]
        );
    }

    #[test]
    fn validate_maps_rejection_to_error() {
        let err = UploadGate::default()
            .validate(&UploadBatch::default())
            .unwrap_err();
        assert_eq!(err.as_rejection().unwrap().stage, "presence");
    }

    #[test]
    fn custom_config_changes_required_keys() {
        let config = GateConfig {
            required_event_keys: vec!["AOI".into()],
            required_layer_keys: vec!["file_name".into()],
            ..GateConfig::default()
        };
        let gate = UploadGate::with_default_stages(config);
        let doc = json!({"AOI": "x", "layers": [{"file_name": "a.csv"}]});
        assert!(gate.evaluate(&batch(&doc, &["a.csv"])).unwrap().is_accepted());
    }
}
