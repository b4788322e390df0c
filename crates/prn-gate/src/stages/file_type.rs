use crate::error::{GateError, ValidationIssue};
use crate::stage::{StageDecision, UploadBatch, UploadContext, UploadStage};

/// Media type and naming checks, run before any content is parsed.
///
/// The metadata upload must declare the configured JSON type and carry the
/// configured marker in its name; every layer must declare the CSV type.
pub struct FileTypeStage;

impl UploadStage for FileTypeStage {
    fn name(&self) -> &str {
        "file_type"
    }

    fn evaluate(
        &self,
        batch: &UploadBatch,
        context: &mut UploadContext<'_>,
    ) -> Result<StageDecision, GateError> {
        let config = context.config;
        let mut issues = Vec::new();

        if let Some(metadata) = &batch.metadata {
            if metadata.content_type != config.metadata_content_type {
                issues.push(ValidationIssue::MetadataFileType {
                    file_name: metadata.file_name.clone(),
                    expected: config.metadata_content_type.clone(),
                    actual: metadata.content_type.clone(),
                });
            }
            if !metadata.file_name.contains(&config.metadata_name_marker) {
                issues.push(ValidationIssue::MetadataFileName {
                    file_name: metadata.file_name.clone(),
                    marker: config.metadata_name_marker.clone(),
                });
            }
        }

        for layer in &batch.layers {
            if layer.content_type != config.layer_content_type {
                issues.push(ValidationIssue::LayerFileType {
                    file_name: layer.file_name.clone(),
                    expected: config.layer_content_type.clone(),
                    actual: layer.content_type.clone(),
                });
            }
        }

        Ok(StageDecision::from_issues(issues))
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::config::GateConfig;
    use crate::error::IssueFamily;
    use crate::stage::UploadFile;
    use crate::stages::fixtures::*;

    fn run(batch: &UploadBatch) -> StageDecision {
        let config = GateConfig::default();
        FileTypeStage
            .evaluate(batch, &mut UploadContext::new(&config))
            .unwrap()
    }

    #[test]
    fn accepts_expected_types() {
        let batch = batch(&document(vec![entry("a.csv")]), &["a.csv"]);
        assert!(run(&batch).is_pass());
    }

    #[test]
    fn rejects_metadata_without_marker() {
        let doc = document(vec![entry("a.csv")]);
        let mut batch = batch(&doc, &["a.csv"]);
        batch.metadata = Some(metadata_file("layers.json", &doc));
        let decision = run(&batch);
        assert!(matches!(
            decision.issues(),
            [ValidationIssue::MetadataFileName { .. }]
        ));
    }

    #[test]
    fn rejects_wrong_metadata_type() {
        let mut batch = batch(&document(vec![entry("a.csv")]), &["a.csv"]);
        batch.metadata = Some(UploadFile::new(
            "a_metadata.json",
            "text/plain",
            Bytes::from_static(b"{}"),
        ));
        let decision = run(&batch);
        assert_eq!(decision.issues().len(), 1);
        assert_eq!(decision.issues()[0].family(), IssueFamily::InvalidFileType);
    }

    #[test]
    fn reports_every_bad_layer() {
        let mut batch = batch(&document(vec![]), &["a.csv"]);
        batch.layers = vec![
            UploadFile::new("a.xls", "application/vnd.ms-excel", Bytes::new()),
            csv("b.csv"),
            UploadFile::new("c.txt", "text/plain", Bytes::new()),
        ];
        let decision = run(&batch);
        let names: Vec<&str> = decision
            .issues()
            .iter()
            .map(|issue| match issue {
                ValidationIssue::LayerFileType { file_name, .. } => file_name.as_str(),
                _ => "",
            })
            .collect();
        assert_eq!(names, vec!["a.xls", "c.txt"]);
    }
}
