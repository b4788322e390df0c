use serde_json::Value;

use crate::error::{GateError, ValidationIssue};
use crate::stage::{StageDecision, UploadBatch, UploadContext, UploadStage};

/// Parses the metadata upload and records it on the context.
///
/// Nothing is recorded when parsing fails.
pub struct ParseStage;

impl UploadStage for ParseStage {
    fn name(&self) -> &str {
        "parse"
    }

    fn evaluate(
        &self,
        batch: &UploadBatch,
        context: &mut UploadContext<'_>,
    ) -> Result<StageDecision, GateError> {
        let metadata = batch
            .metadata
            .as_ref()
            .ok_or_else(|| GateError::stage(self.name(), "batch has no metadata upload"))?;

        let document: Value = match serde_json::from_slice(&metadata.content) {
            Ok(document) => document,
            Err(e) => {
                tracing::debug!(
                    file = %metadata.file_name,
                    error = %e,
                    "metadata is not valid JSON"
                );
                return Ok(StageDecision::Fail {
                    issues: vec![ValidationIssue::MalformedMetadata],
                });
            }
        };

        if !document.is_object() {
            return Ok(StageDecision::Fail {
                issues: vec![ValidationIssue::MetadataNotObject],
            });
        }

        context.metadata = Some(document);
        Ok(StageDecision::Pass)
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::config::GateConfig;
    use crate::stage::UploadFile;
    use crate::stages::fixtures::*;

    fn with_content(content: &'static [u8]) -> UploadBatch {
        UploadBatch {
            metadata: Some(UploadFile::new(
                "layer_1_metadata.json",
                "application/json",
                Bytes::from_static(content),
            )),
            layers: vec![csv("layer_1.csv")],
        }
    }

    #[test]
    fn records_parsed_document() {
        let config = GateConfig::default();
        let mut context = UploadContext::new(&config);
        let batch = batch(&document(vec![entry("layer_1.csv")]), &["layer_1.csv"]);
        assert!(ParseStage.evaluate(&batch, &mut context).unwrap().is_pass());
        assert_eq!(context.metadata.unwrap()["AOI"], "POLYGON((0 0, 1 0, 1 1, 0 0))");
    }

    #[test]
    fn csv_content_is_malformed() {
        let config = GateConfig::default();
        let mut context = UploadContext::new(&config);
        let decision = ParseStage
            .evaluate(&with_content(b"lat,lon\n1,2\n"), &mut context)
            .unwrap();
        assert_eq!(decision.issues(), &[ValidationIssue::MalformedMetadata]);
        assert!(context.metadata.is_none());
    }

    #[test]
    fn array_document_is_rejected() {
        let config = GateConfig::default();
        let mut context = UploadContext::new(&config);
        let decision = ParseStage
            .evaluate(&with_content(b"[1, 2]"), &mut context)
            .unwrap();
        assert_eq!(decision.issues(), &[ValidationIssue::MetadataNotObject]);
        assert!(context.metadata.is_none());
    }

    #[test]
    fn missing_upload_is_stage_error() {
        let config = GateConfig::default();
        let err = ParseStage
            .evaluate(&UploadBatch::default(), &mut UploadContext::new(&config))
            .unwrap_err();
        assert!(matches!(err, GateError::StageError { .. }));
    }
}
