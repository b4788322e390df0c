use prn_gate::{GateError, ValidationFailure};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LayerError {
    #[error("invalid name: {0}")]
    InvalidName(#[from] prn_keys::KeyError),

    #[error(transparent)]
    Validation(ValidationFailure),

    #[error("upload gate error: {0}")]
    Gate(GateError),

    #[error("manifest for event {event} is not valid JSON: {source}")]
    MalformedManifest {
        event: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("store error: {0}")]
    Store(#[from] prn_store::StoreError),

    #[error("version counter for event {event} is exhausted at {current}")]
    VersionOverflow { event: String, current: u64 },
}

impl From<GateError> for LayerError {
    fn from(err: GateError) -> Self {
        match err {
            GateError::Rejected(failure) => Self::Validation(failure),
            other => Self::Gate(other),
        }
    }
}

impl From<ValidationFailure> for LayerError {
    fn from(failure: ValidationFailure) -> Self {
        Self::Validation(failure)
    }
}

pub type LayerResult<T> = Result<T, LayerError>;
