use std::collections::HashSet;

use crate::error::{GateError, ValidationIssue};
use crate::stage::{
    entry_file_name, metadata_entries, StageDecision, UploadBatch, UploadContext, UploadStage,
};

/// Cheap structural checks on the metadata `layers` array.
///
/// The entry count must equal the number of uploaded layer files, then all
/// `file_name` values must be pairwise distinct. A missing or non-array
/// `layers` counts as zero entries.
pub struct CountStage;

impl UploadStage for CountStage {
    fn name(&self) -> &str {
        "count"
    }

    fn evaluate(
        &self,
        batch: &UploadBatch,
        context: &mut UploadContext<'_>,
    ) -> Result<StageDecision, GateError> {
        let entries = metadata_entries(context.require_metadata(self.name())?);

        if entries.len() != batch.layers.len() {
            return Ok(StageDecision::Fail {
                issues: vec![ValidationIssue::CountMismatch {
                    entries: entries.len(),
                    files: batch.layers.len(),
                }],
            });
        }

        let mut seen = HashSet::new();
        let unique = entries
            .iter()
            .filter_map(entry_file_name)
            .all(|name| seen.insert(name));
        if !unique {
            return Ok(StageDecision::Fail {
                issues: vec![ValidationIssue::DuplicateEntries],
            });
        }

        Ok(StageDecision::Pass)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::config::GateConfig;
    use crate::stages::fixtures::*;

    fn run(doc: Value, layers: &[&str]) -> StageDecision {
        let config = GateConfig::default();
        let batch = batch(&doc, layers);
        let mut context = UploadContext::new(&config).with_metadata(doc);
        CountStage.evaluate(&batch, &mut context).unwrap()
    }

    #[test]
    fn matching_count_passes() {
        let doc = document(vec![entry("a.csv"), entry("b.csv")]);
        assert!(run(doc, &["a.csv", "b.csv"]).is_pass());
    }

    #[test]
    fn more_entries_than_files() {
        let doc = document(vec![entry("a.csv"), entry("b.csv")]);
        assert_eq!(
            run(doc, &["a.csv"]).issues(),
            &[ValidationIssue::CountMismatch { entries: 2, files: 1 }]
        );
    }

    #[test]
    fn missing_layers_array_counts_as_zero() {
        let doc = json!({"AOI": "x", "created_at": "now"});
        assert_eq!(
            run(doc, &["a.csv"]).issues(),
            &[ValidationIssue::CountMismatch { entries: 0, files: 1 }]
        );
    }

    #[test]
    fn duplicate_file_names() {
        let doc = document(vec![entry("layer_1.csv"), entry("layer_1.csv")]);
        assert_eq!(
            run(doc, &["layer_1.csv", "layer_1.csv"]).issues(),
            &[ValidationIssue::DuplicateEntries]
        );
    }

    #[test]
    fn duplicate_non_string_file_names() {
        let doc = json!({
            "AOI": "x",
            "created_at": "now",
            "layers": [{"file_name": 1}, {"file_name": 1}],
        });
        assert_eq!(
            run(doc, &["1", "2"]).issues(),
            &[ValidationIssue::DuplicateEntries]
        );
    }

    #[test]
    fn string_and_number_names_are_distinct() {
        let doc = json!({
            "AOI": "x",
            "created_at": "now",
            "layers": [{"file_name": 1}, {"file_name": "1.csv"}],
        });
        assert!(run(doc, &["1", "1.csv"]).is_pass());
    }

    #[test]
    fn count_is_checked_before_duplicates() {
        let doc = document(vec![entry("a.csv"), entry("a.csv")]);
        assert!(matches!(
            run(doc, &["a.csv"]).issues(),
            [ValidationIssue::CountMismatch { .. }]
        ));
    }

    #[test]
    fn requires_parsed_metadata() {
        let config = GateConfig::default();
        let err = CountStage
            .evaluate(&UploadBatch::default(), &mut UploadContext::new(&config))
            .unwrap_err();
        assert!(matches!(err, GateError::StageError { ref stage, .. } if stage == "count"));
    }
}
