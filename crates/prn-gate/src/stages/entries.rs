use crate::error::{GateError, ValidationIssue};
use crate::stage::{
    entry_file_name, metadata_entries, StageDecision, UploadBatch, UploadContext, UploadStage,
};

/// Per-entry schema and correlation checks on the metadata `layers` array.
///
/// Unlike the pipeline as a whole this stage is not fail-fast: every entry is
/// checked so a single response surfaces all problems. For each entry the
/// missing attributes are reported first, then whether its `file_name`
/// matches exactly one uploaded layer file.
pub struct EntriesStage;

impl UploadStage for EntriesStage {
    fn name(&self) -> &str {
        "entries"
    }

    fn evaluate(
        &self,
        batch: &UploadBatch,
        context: &mut UploadContext<'_>,
    ) -> Result<StageDecision, GateError> {
        let metadata = context.require_metadata(self.name())?;
        let required = &context.config.required_layer_keys;
        let mut issues = Vec::new();

        for (index, entry) in metadata_entries(metadata).iter().enumerate() {
            let missing: Vec<String> = required
                .iter()
                .filter(|key| entry.get(key.as_str()).is_none())
                .cloned()
                .collect();
            if !missing.is_empty() {
                issues.push(ValidationIssue::MissingEntryKeys {
                    index,
                    keys: missing,
                });
            }

            let Some(file_name) = entry_file_name(entry) else {
                continue;
            };
            let matches = batch
                .layers
                .iter()
                .filter(|layer| layer.file_name == file_name)
                .count();
            match matches {
                1 => {}
                0 => issues.push(ValidationIssue::MissingLayerFile { index, file_name }),
                _ => issues.push(ValidationIssue::AmbiguousLayerFile { index, file_name }),
            }
        }

        Ok(StageDecision::from_issues(issues))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::config::GateConfig;
    use crate::stages::fixtures::*;

    fn run(doc: Value, layers: &[&str]) -> Vec<String> {
        let config = GateConfig::default();
        let batch = batch(&doc, layers);
        let mut context = UploadContext::new(&config).with_metadata(doc);
        let decision = EntriesStage.evaluate(&batch, &mut context).unwrap();
        decision.issues().iter().map(ToString::to_string).collect()
    }

    #[test]
    fn well_formed_entries_pass() {
        let doc = document(vec![entry("layer_1.csv"), entry("layer_2.csv")]);
        assert!(run(doc, &["layer_2.csv", "layer_1.csv"]).is_empty());
    }

    #[test]
    fn missing_file_name_attribute() {
        let doc = document(vec![json!({"description": "d", "legend": "l"})]);
        assert_eq!(
            run(doc, &["layer_1.csv"]),
            vec!["Invalid metadata - Layer: 0 missing attributes: file_name"]
        );
    }

    #[test]
    fn unknown_file_is_reported() {
        let doc = document(vec![entry("incorret_layer.csv")]);
        assert_eq!(
            run(doc, &["layer_1.csv"]),
            vec!["Invalid metadata - Layer: 0 lists missing layer file: incorret_layer.csv"]
        );
    }

    #[test]
    fn checks_continue_past_first_bad_entry() {
        let doc = document(vec![
            json!({"file_name": "a.csv"}),
            entry("b.csv"),
            entry("nope.csv"),
        ]);
        assert_eq!(
            run(doc, &["a.csv", "b.csv", "c.csv"]),
            vec![
                "Invalid metadata - Layer: 0 missing attributes: description,legend",
                "Invalid metadata - Layer: 2 lists missing layer file: nope.csv",
            ]
        );
    }

    #[test]
    fn file_uploaded_twice_is_ambiguous() {
        let doc = document(vec![entry("a.csv"), entry("b.csv")]);
        assert_eq!(
            run(doc, &["a.csv", "a.csv"]),
            vec![
                "Invalid metadata - Layer: 0 lists ambiguous layer file: a.csv",
                "Invalid metadata - Layer: 1 lists missing layer file: b.csv",
            ]
        );
    }

    #[test]
    fn non_object_entry_misses_every_key() {
        let doc = document(vec![json!("a.csv")]);
        assert_eq!(
            run(doc, &["a.csv"]),
            vec!["Invalid metadata - Layer: 0 missing attributes: file_name,description,legend"]
        );
    }
}
