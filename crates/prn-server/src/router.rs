use axum::extract::DefaultBodyLimit;
use axum::http::request::Parts;
use axum::http::{header, HeaderValue, Method};
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use regex::Regex;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth;
use crate::handler;
use crate::state::AppState;

/// Build the router: public listings at the root, uploads and transitions
/// under `/pending` behind basic auth, health for everything else.
pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/events", get(handler::list_events))
        .route("/events/:event", get(handler::event_manifest))
        .route("/layers/:event", get(handler::approved_layers))
        .route("/layers/:event/:version/:layer", get(handler::approved_layer));

    let protected = Router::new()
        .route(
            "/layers/:event",
            get(handler::pending_layers).post(handler::upload),
        )
        .route("/layers/:event/approve/:version", post(handler::approve))
        .route(
            "/layers/:event/revert_approved/:version",
            post(handler::revert_approved),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_auth));

    Router::new()
        .merge(public)
        .nest("/pending", protected)
        .fallback(handler::health)
        .layer(DefaultBodyLimit::max(state.config().max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(state.cors_origins().clone()))
        .with_state(state)
}

/// CORS for origins matching `origins`.
pub fn cors_layer(origins: Regex) -> CorsLayer {
    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &Parts| {
                origin.to_str().is_ok_and(|origin| origins.is_match(origin))
            },
        ))
}
