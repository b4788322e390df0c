use crate::error::{GateError, ValidationIssue};
use crate::stage::{StageDecision, UploadBatch, UploadContext, UploadStage};

/// Checks the metadata document for every required top-level attribute.
///
/// One issue per missing attribute, in configuration order.
pub struct EventKeysStage;

impl UploadStage for EventKeysStage {
    fn name(&self) -> &str {
        "event_keys"
    }

    fn evaluate(
        &self,
        _batch: &UploadBatch,
        context: &mut UploadContext<'_>,
    ) -> Result<StageDecision, GateError> {
        let metadata = context.require_metadata(self.name())?;
        let issues = context
            .config
            .required_event_keys
            .iter()
            .filter(|key| metadata.get(key.as_str()).is_none())
            .map(|key| ValidationIssue::MissingEventKey { key: key.clone() })
            .collect();
        Ok(StageDecision::from_issues(issues))
    }
}
