use axum::extract::{Multipart, Path, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use prn_gate::{UploadBatch, UploadFile};
use prn_layers::{
    EventSummary, LayerLink, LayerRepository, LayerResult, LayerState, UploadReceipt, Version,
    VersionView,
};
use serde_json::{json, Value};

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// Run a repository call on the blocking pool.
async fn blocking<T, F>(state: &AppState, f: F) -> ServerResult<T>
where
    F: FnOnce(&LayerRepository) -> LayerResult<T> + Send + 'static,
    T: Send + 'static,
{
    let repo = state.repo().clone();
    tokio::task::spawn_blocking(move || f(&repo))
        .await
        .map_err(|e| ServerError::Internal(format!("repository task failed: {e}")))?
        .map_err(ServerError::from)
}

fn parse_version(token: &str) -> ServerResult<Version> {
    token
        .parse()
        .map_err(|_| ServerError::BadRequest(format!("invalid version: {token}")))
}

// ---- Public ----

pub async fn list_events(State(state): State<AppState>) -> ServerResult<Json<Vec<EventSummary>>> {
    blocking(&state, |repo| repo.list_events()).await.map(Json)
}

pub async fn event_manifest(
    State(state): State<AppState>,
    Path(event): Path<String>,
) -> ServerResult<Json<Value>> {
    blocking(&state, move |repo| repo.event_manifest(&event))
        .await
        .map(Json)
}

pub async fn approved_layers(
    State(state): State<AppState>,
    Path(event): Path<String>,
) -> ServerResult<Json<Vec<VersionView>>> {
    blocking(&state, move |repo| repo.list_layers(&event, LayerState::Approved))
        .await
        .map(Json)
}

pub async fn approved_layer(
    State(state): State<AppState>,
    Path((event, version, layer)): Path<(String, String, String)>,
) -> ServerResult<Json<Vec<VersionView>>> {
    let version = parse_version(&version)?;
    blocking(&state, move |repo| {
        repo.find_layer(&event, LayerState::Approved, version, &layer)
    })
    .await
    .map(Json)
}

/// Answers every unrouted GET.
pub async fn health(State(state): State<AppState>, method: Method) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return (StatusCode::NOT_FOUND, Json(json!({ "errors": ["not found"] }))).into_response();
    }
    Json(json!({
        "health": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "commit_id": state.config().commit_id,
    }))
    .into_response()
}

// ---- Protected ----

pub async fn pending_layers(
    State(state): State<AppState>,
    Path(event): Path<String>,
) -> ServerResult<Json<Vec<VersionView>>> {
    blocking(&state, move |repo| repo.list_layers(&event, LayerState::Pending))
        .await
        .map(Json)
}

pub async fn upload(
    State(state): State<AppState>,
    Path(event): Path<String>,
    multipart: Multipart,
) -> ServerResult<(StatusCode, Json<UploadReceipt>)> {
    let batch = read_batch(multipart).await?;
    tracing::debug!(
        event = %event,
        layers = batch.layers.len(),
        has_metadata = batch.metadata.is_some(),
        "upload received"
    );
    let receipt = blocking(&state, move |repo| repo.upload_batch(&event, &batch)).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

pub async fn approve(
    State(state): State<AppState>,
    Path((event, version)): Path<(String, String)>,
) -> ServerResult<Json<Vec<LayerLink>>> {
    let version = parse_version(&version)?;
    blocking(&state, move |repo| repo.approve(&event, version))
        .await
        .map(Json)
}

pub async fn revert_approved(
    State(state): State<AppState>,
    Path((event, version)): Path<(String, String)>,
) -> ServerResult<(StatusCode, Json<Vec<LayerLink>>)> {
    let version = parse_version(&version)?;
    let moved = blocking(&state, move |repo| repo.revert(&event, version)).await?;
    Ok((StatusCode::CREATED, Json(moved)))
}

/// Collect the `metadata` part and every `layers` part of a form upload.
/// Other parts are ignored; a repeated `metadata` part keeps the last one.
async fn read_batch(mut multipart: Multipart) -> ServerResult<UploadBatch> {
    let mut batch = UploadBatch::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let is_metadata = name == "metadata";
        let is_layer = name == "layers" || name == "layers[]";
        if !is_metadata && !is_layer {
            tracing::debug!(field = %name, "ignoring form field");
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| ServerError::BadRequest(format!("form field {name} is not a file")))?;
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let content = field
            .bytes()
            .await
            .map_err(|e| ServerError::BadRequest(format!("failed to read {file_name}: {e}")))?;

        let file = UploadFile::new(file_name, content_type, content);
        if is_metadata {
            batch.metadata = Some(file);
        } else {
            batch.layers.push(file);
        }
    }
    Ok(batch)
}
