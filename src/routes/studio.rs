//! Studio routes: sessions, host selection, layout editing, report assembly.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::backend::HostSummary;
use crate::layout::Document;
use crate::report::{ReportOptions, ReportRequest};
use crate::routes::ApiError;
use crate::services::session::{self, HostEvaluation, InstanceChange, SessionSnapshot};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SetHostsBody {
    pub host_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddInstanceBody {
    #[serde(alias = "type")]
    pub module_key: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateInstanceBody {
    /// Absent keeps the current title; blank resets it to the module's
    /// display name.
    #[serde(default)]
    pub title: Option<String>,
    pub config: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct ReorderBody {
    pub order: Vec<String>,
}

/// `POST /api/sessions`: open a session over a freshly loaded catalog.
pub async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionSnapshot>) {
    (StatusCode::CREATED, Json(session::create_session(&state).await))
}

/// `GET /api/sessions/:id`: current session snapshot.
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    Ok(Json(session::get_session(&state, session_id).await?))
}

/// `DELETE /api/sessions/:id`
pub async fn delete_session(State(state): State<AppState>, Path(session_id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    session::delete_session(&state, session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/hosts/:group_ids`: hosts in the comma-separated groups.
pub async fn list_hosts(
    State(state): State<AppState>,
    Path(group_ids): Path<String>,
) -> Result<Json<Vec<HostSummary>>, ApiError> {
    let groups = split_ids(&group_ids);
    Ok(Json(session::list_hosts(&state, &groups).await?))
}

/// `PUT /api/sessions/:id/hosts`: replace the host selection.
pub async fn set_hosts(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(body): Json<SetHostsBody>,
) -> Result<Json<HostEvaluation>, ApiError> {
    Ok(Json(session::evaluate_hosts(&state, session_id, body.host_ids).await?))
}

/// `POST /api/sessions/:id/instances`: append a module instance.
pub async fn add_instance(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(body): Json<AddInstanceBody>,
) -> Result<(StatusCode, Json<InstanceChange>), ApiError> {
    let change = session::add_instance(&state, session_id, &body.module_key).await?;
    Ok((StatusCode::CREATED, Json(change)))
}

/// `PATCH /api/sessions/:id/instances/:instance_id`: commit title and config.
pub async fn update_instance(
    State(state): State<AppState>,
    Path((session_id, instance_id)): Path<(Uuid, String)>,
    Json(body): Json<UpdateInstanceBody>,
) -> Result<Json<InstanceChange>, ApiError> {
    let change = session::update_instance(&state, session_id, &instance_id, body.title.as_deref(), &body.config).await?;
    Ok(Json(change))
}

/// `DELETE /api/sessions/:id/instances/:instance_id`
pub async fn remove_instance(
    State(state): State<AppState>,
    Path((session_id, instance_id)): Path<(Uuid, String)>,
) -> Result<Json<InstanceChange>, ApiError> {
    Ok(Json(session::remove_instance(&state, session_id, &instance_id).await?))
}

/// `PUT /api/sessions/:id/order`: apply a full permutation of instance ids.
pub async fn reorder(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(body): Json<ReorderBody>,
) -> Result<Json<Document>, ApiError> {
    Ok(Json(session::reorder(&state, session_id, &body.order).await?))
}

/// `GET /api/sessions/:id/document`
pub async fn get_document(State(state): State<AppState>, Path(session_id): Path<Uuid>) -> Result<Json<Document>, ApiError> {
    Ok(Json(session::document(&state, session_id).await?))
}

/// `PUT /api/sessions/:id/document`: restore a saved layout.
pub async fn put_document(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(document): Json<Document>,
) -> Result<Json<Document>, ApiError> {
    Ok(Json(session::restore_document(&state, session_id, &document).await?))
}

/// `POST /api/sessions/:id/report`: assemble the renderer request.
pub async fn build_report(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(options): Json<ReportOptions>,
) -> Result<Json<ReportRequest>, ApiError> {
    Ok(Json(session::build_report(&state, session_id, options).await?))
}

fn split_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
#[path = "studio_test.rs"]
mod tests;
