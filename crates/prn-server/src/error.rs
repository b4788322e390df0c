use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use prn_gate::IssueFamily;
use prn_layers::LayerError;
use serde_json::json;
use thiserror::Error;

use crate::auth::REALM;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("authentication required")]
    Unauthorized,

    #[error(transparent)]
    Layers(#[from] LayerError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Layers(LayerError::Validation(failure)) => match failure.family() {
                IssueFamily::MissingFiles | IssueFamily::InvalidFileType => StatusCode::BAD_REQUEST,
                IssueFamily::InvalidMetadata => StatusCode::UNPROCESSABLE_ENTITY,
            },
            Self::Layers(LayerError::InvalidName(_)) => StatusCode::BAD_REQUEST,
            Self::Layers(LayerError::Store(e)) if e.is_not_found() => StatusCode::NOT_FOUND,
            Self::Layers(_) | Self::Config(_) | Self::Io(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Messages for the `errors` array of the response body.
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Layers(LayerError::Validation(failure)) => failure.messages(),
            other => vec![other.to_string()],
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }

        let mut response = (status, Json(json!({ "errors": self.messages() }))).into_response();
        if matches!(self, Self::Unauthorized) {
            if let Ok(value) = HeaderValue::from_str(&format!("Basic realm=\"{REALM}\"")) {
                response.headers_mut().insert(header::WWW_AUTHENTICATE, value);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use prn_gate::{ValidationFailure, ValidationIssue};

    use super::*;

    fn rejected(issue: ValidationIssue) -> ServerError {
        ServerError::Layers(LayerError::Validation(ValidationFailure::new("test", vec![issue])))
    }

    #[test]
    fn validation_families_map_to_status() {
        assert_eq!(
            rejected(ValidationIssue::MissingLayerFiles).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            rejected(ValidationIssue::LayerFileType {
                file_name: "a.txt".into(),
                expected: "text/csv".into(),
                actual: "text/plain".into(),
            })
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            rejected(ValidationIssue::DuplicateEntries).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn validation_messages_are_prefixed() {
        assert_eq!(
            rejected(ValidationIssue::DuplicateEntries).messages(),
            vec!["Invalid metadata - file contains non unique entries"]
        );
    }

    #[test]
    fn unauthorized_carries_challenge() {
        let response = ServerError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers()[header::WWW_AUTHENTICATE],
            "Basic realm=\"Protected Area\""
        );
    }

    #[test]
    fn missing_object_is_not_found() {
        let err = ServerError::Layers(LayerError::Store(prn_store::StoreError::NotFound(
            "k".into(),
        )));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }
}
