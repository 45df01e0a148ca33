//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the studio's JSON API under a single Axum router. Every
//! handler translates a domain error into an [`ApiError`]: a status chosen by
//! error class plus the `{code, message, retryable}` body clients branch on.

pub mod studio;

use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, patch, post, put};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::ErrorCode;
use crate::layout::LayoutError;
use crate::services::session::SessionError;
use crate::state::AppState;

/// Build the application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/sessions", post(studio::create_session))
        .route(
            "/api/sessions/{id}",
            get(studio::get_session).delete(studio::delete_session),
        )
        .route("/api/hosts/{group_ids}", get(studio::list_hosts))
        .route("/api/sessions/{id}/hosts", put(studio::set_hosts))
        .route("/api/sessions/{id}/instances", post(studio::add_instance))
        .route(
            "/api/sessions/{id}/instances/{instance_id}",
            patch(studio::update_instance).delete(studio::remove_instance),
        )
        .route("/api/sessions/{id}/order", put(studio::reorder))
        .route(
            "/api/sessions/{id}/document",
            get(studio::get_document).put(studio::put_document),
        )
        .route("/api/sessions/{id}/report", post(studio::build_report))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

// =============================================================================
// API ERROR
// =============================================================================

/// JSON error body returned by every failing handler.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub retryable: bool,
}

impl ApiError {
    pub fn new(status: StatusCode, err: &impl ErrorCode) -> Self {
        Self { status, code: err.error_code(), message: err.to_string(), retryable: err.retryable() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        Self::new(session_error_to_status(&err), &err)
    }
}

pub(crate) fn session_error_to_status(err: &SessionError) -> StatusCode {
    match err {
        SessionError::NotFound(_) => StatusCode::NOT_FOUND,
        SessionError::HostsUnavailable(_) => StatusCode::BAD_GATEWAY,
        SessionError::Compatibility(_) => StatusCode::SERVICE_UNAVAILABLE,
        SessionError::Report(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SessionError::Layout(e) => match e {
            LayoutError::InstanceNotFound(_) => StatusCode::NOT_FOUND,
            LayoutError::ModuleNotCompatible(_)
            | LayoutError::ReorderMismatch(_)
            | LayoutError::DuplicateInstance(_) => StatusCode::CONFLICT,
            LayoutError::UnknownModule(_) | LayoutError::Config(_) => StatusCode::UNPROCESSABLE_ENTITY,
        },
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
