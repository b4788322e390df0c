use crate::error::{GateError, ValidationIssue};
use crate::stage::{StageDecision, UploadBatch, UploadContext, UploadStage};

/// Checks that the batch carries a metadata file and at least one layer file.
///
/// Reports both problems when both are missing.
pub struct PresenceStage;

impl UploadStage for PresenceStage {
    fn name(&self) -> &str {
        "presence"
    }

    fn evaluate(
        &self,
        batch: &UploadBatch,
        _context: &mut UploadContext<'_>,
    ) -> Result<StageDecision, GateError> {
        let mut issues = Vec::new();
        if batch.metadata.is_none() {
            issues.push(ValidationIssue::MissingMetadataFile);
        }
        if batch.layers.is_empty() {
            issues.push(ValidationIssue::MissingLayerFiles);
        }
        Ok(StageDecision::from_issues(issues))
    }
}
