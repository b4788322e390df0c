use std::fmt;

/// Which family of problem an issue belongs to.
///
/// Each family renders with its own message prefix so callers can tell a
/// missing upload from a bad media type from a schema problem.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IssueFamily {
    MissingFiles,
    InvalidFileType,
    InvalidMetadata,
}

impl IssueFamily {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::MissingFiles => "Missing files - ",
            Self::InvalidFileType => "Invalid file type - ",
            Self::InvalidMetadata => "Invalid metadata - ",
        }
    }
}

/// A single problem found in an upload batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationIssue {
    /// No metadata upload was supplied.
    MissingMetadataFile,
    /// No layer uploads were supplied.
    MissingLayerFiles,
    /// The metadata upload declared the wrong media type.
    MetadataFileType {
        file_name: String,
        expected: String,
        actual: String,
    },
    /// The metadata upload's name lacks the required marker.
    MetadataFileName { file_name: String, marker: String },
    /// A layer upload declared the wrong media type.
    LayerFileType {
        file_name: String,
        expected: String,
        actual: String,
    },
    /// The metadata content is not valid JSON.
    MalformedMetadata,
    /// The metadata content is valid JSON but not an object.
    MetadataNotObject,
    /// `layers` entry count differs from the number of uploaded layer files.
    CountMismatch { entries: usize, files: usize },
    /// Two or more `layers` entries share a `file_name`.
    DuplicateEntries,
    /// A required top-level attribute is absent.
    MissingEventKey { key: String },
    /// A `layers` entry lacks required attributes.
    MissingEntryKeys { index: usize, keys: Vec<String> },
    /// A `layers` entry names a file that was not uploaded.
    MissingLayerFile { index: usize, file_name: String },
    /// A `layers` entry names a file uploaded more than once.
    AmbiguousLayerFile { index: usize, file_name: String },
}

impl ValidationIssue {
    pub fn family(&self) -> IssueFamily {
        match self {
            Self::MissingMetadataFile | Self::MissingLayerFiles => IssueFamily::MissingFiles,
            Self::MetadataFileType { .. }
            | Self::MetadataFileName { .. }
            | Self::LayerFileType { .. } => IssueFamily::InvalidFileType,
            _ => IssueFamily::InvalidMetadata,
        }
    }

    /// The message without its family prefix.
    pub fn detail(&self) -> String {
        match self {
            Self::MissingMetadataFile => "You must specify a metadata file".into(),
            Self::MissingLayerFiles => "You must specify at least one layer file".into(),
            Self::MetadataFileType {
                file_name,
                expected,
                actual,
            } => format!("metadata file {file_name} must be of type {expected}, got {actual}"),
            Self::MetadataFileName { file_name, marker } => {
                format!("metadata file name must contain '{marker}': {file_name}")
            }
            Self::LayerFileType {
                file_name,
                expected,
                actual,
            } => format!("layer file {file_name} must be of type {expected}, got {actual}"),
            Self::MalformedMetadata => "please lint your JSON file".into(),
            Self::MetadataNotObject => "the document must be a JSON object".into(),
            Self::CountMismatch { .. } => {
                "number of entries does not match the number of uploaded files".into()
            }
            Self::DuplicateEntries => "file contains non unique entries".into(),
            Self::MissingEventKey { key } => format!("please supply the {key} attribute"),
            Self::MissingEntryKeys { index, keys } => {
                format!("Layer: {index} missing attributes: {}", keys.join(","))
            }
            Self::MissingLayerFile { index, file_name } => {
                format!("Layer: {index} lists missing layer file: {file_name}")
            }
            Self::AmbiguousLayerFile { index, file_name } => {
                format!("Layer: {index} lists ambiguous layer file: {file_name}")
            }
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.family().prefix(), self.detail())
    }
}

/// An upload batch rejected by one stage of the gate.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("upload rejected by {stage} stage: {}", join_issues(.issues))]
pub struct ValidationFailure {
    /// Name of the stage that rejected the batch.
    pub stage: String,
    /// Problems in the order the stage found them. Never empty.
    pub issues: Vec<ValidationIssue>,
}

impl ValidationFailure {
    pub fn new(stage: impl Into<String>, issues: Vec<ValidationIssue>) -> Self {
        Self {
            stage: stage.into(),
            issues,
        }
    }

    /// Rendered, prefixed messages in order.
    pub fn messages(&self) -> Vec<String> {
        self.issues.iter().map(ToString::to_string).collect()
    }

    /// Family of the first issue; a failing stage only reports one family.
    pub fn family(&self) -> IssueFamily {
        self.issues
            .first()
            .map_or(IssueFamily::InvalidMetadata, ValidationIssue::family)
    }
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors that can occur during gate evaluation.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// The batch failed validation.
    #[error(transparent)]
    Rejected(#[from] ValidationFailure),

    /// A stage could not run, e.g. its preconditions were not established.
    #[error("stage error in '{stage}': {message}")]
    StageError { stage: String, message: String },
}

impl GateError {
    /// Create a stage error with a name and message.
    pub fn stage(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StageError {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// The validation failure, if this error is a rejection.
    pub fn as_rejection(&self) -> Option<&ValidationFailure> {
        match self {
            Self::Rejected(failure) => Some(failure),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_by_family() {
        assert_eq!(
            ValidationIssue::MissingMetadataFile.to_string(),
            "Missing files - You must specify a metadata file"
        );
        assert_eq!(
            ValidationIssue::MalformedMetadata.to_string(),
            "Invalid metadata - please lint your JSON file"
        );
        assert!(ValidationIssue::LayerFileType {
            file_name: "a.txt".into(),
            expected: "text/csv".into(),
            actual: "text/plain".into(),
        }
        .to_string()
        .starts_with("Invalid file type - "));
    }

    #[test]
    fn entry_messages_carry_index() {
        let issue = ValidationIssue::MissingEntryKeys {
            index: 0,
            keys: vec!["file_name".into(), "legend".into()],
        };
        assert_eq!(
            issue.to_string(),
            "Invalid metadata - Layer: 0 missing attributes: file_name,legend"
        );
        let issue = ValidationIssue::MissingLayerFile {
            index: 2,
            file_name: "incorret_layer.csv".into(),
        };
        assert_eq!(
            issue.to_string(),
            "Invalid metadata - Layer: 2 lists missing layer file: incorret_layer.csv"
        );
    }

    #[test]
    fn failure_display_joins_messages() {
        let failure = ValidationFailure::new(
            "presence",
            vec![
                ValidationIssue::MissingMetadataFile,
                ValidationIssue::MissingLayerFiles,
            ],
        );
        assert_eq!(failure.family(), IssueFamily::MissingFiles);
        let text = failure.to_string();
        assert!(text.starts_with("upload rejected by presence stage"));
        assert!(text.contains("at least one layer file"));
    }

    #[test]
    fn gate_error_exposes_rejection() {
        let err = GateError::from(ValidationFailure::new(
            "count",
            vec![ValidationIssue::DuplicateEntries],
        ));
        assert_eq!(err.as_rejection().unwrap().stage, "count");
        assert!(GateError::stage("count", "boom").as_rejection().is_none());
    }
}
