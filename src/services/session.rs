//! Session service: every studio operation, applied to one editing session.
//!
//! DESIGN
//! ======
//! Each operation takes the sessions write lock, runs to completion, and
//! answers with the freshly serialized document, so two mutations on the
//! same layout never interleave and callers always see the document their
//! change produced.
//!
//! Backend calls are the only suspension points and are never awaited while
//! the lock is held. Compatibility evaluation takes its ticket under the
//! lock, releases it for the backend round-trip, and re-acquires it to apply
//! or discard the answer. Layout edits proceed meanwhile.
//!
//! ERROR HANDLING
//! ==============
//! A catalog that cannot be loaded does not fail session creation: the
//! session is created with an empty catalog and the reason is kept for the
//! caller to display.
//!
//! LIFETIME
//! ========
//! Every operation touches its session. A background sweep drops sessions
//! left untouched for longer than `AppState::session_ttl`.

use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use crate::backend::HostSummary;
use crate::catalog::ModuleCatalog;
use crate::compat::{CompatibilityError, CompatibilityStatus, EvaluationOutcome, ModuleCard};
use crate::error::ErrorCode;
use crate::layout::{Document, LayoutDocument, LayoutError, ModuleInstance};
use crate::report::{self, ReportError, ReportOptions, ReportRequest};
use crate::state::{AppState, StudioSession};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session not found: {0}")]
    NotFound(Uuid),
    #[error("hosts unavailable: {0}")]
    HostsUnavailable(String),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Compatibility(#[from] CompatibilityError),
    #[error(transparent)]
    Report(#[from] ReportError),
}

impl ErrorCode for SessionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_SESSION_NOT_FOUND",
            Self::HostsUnavailable(_) => "E_HOSTS_UNAVAILABLE",
            Self::Layout(e) => e.error_code(),
            Self::Compatibility(e) => e.error_code(),
            Self::Report(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::HostsUnavailable(_) => true,
            Self::Compatibility(e) => e.retryable(),
            Self::NotFound(_) | Self::Layout(_) | Self::Report(_) => false,
        }
    }
}

/// Everything a client needs to draw the studio.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub catalog_error: Option<String>,
    pub modules: Vec<ModuleCard>,
    pub compatibility: CompatibilityStatus,
    pub hosts: Vec<String>,
    pub document: Document,
}

/// Result of an instance mutation together with the document it produced.
#[derive(Debug, Clone, Serialize)]
pub struct InstanceChange {
    pub instance: ModuleInstance,
    pub document: Document,
}

#[derive(Debug, Clone, Serialize)]
pub struct HostEvaluation {
    pub outcome: EvaluationOutcome,
    pub compatibility: CompatibilityStatus,
    pub modules: Vec<ModuleCard>,
}

fn snapshot_of(session_id: Uuid, session: &StudioSession) -> SessionSnapshot {
    SessionSnapshot {
        session_id,
        catalog_error: session.catalog_error.clone(),
        modules: session.compat.module_cards(&session.catalog),
        compatibility: session.compat.status().clone(),
        hosts: session.compat.selection().iter().cloned().collect(),
        document: session.layout.serialize(),
    }
}

async fn with_session<T>(
    state: &AppState,
    session_id: Uuid,
    op: impl FnOnce(&mut StudioSession) -> Result<T, SessionError>,
) -> Result<T, SessionError> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&session_id).ok_or(SessionError::NotFound(session_id))?;
    session.touch();
    op(session)
}

// =============================================================================
// LIFECYCLE
// =============================================================================

/// Create a session, loading its module catalog from the backend.
pub async fn create_session(state: &AppState) -> SessionSnapshot {
    let session = match ModuleCatalog::load(state.backend.as_ref()).await {
        Ok(catalog) => StudioSession::new(catalog),
        Err(e) => {
            warn!(error = %e, "catalog unavailable; session starts with an empty catalog");
            StudioSession::without_catalog(e.to_string())
        }
    };

    let session_id = Uuid::new_v4();
    let snapshot = snapshot_of(session_id, &session);
    state.sessions.write().await.insert(session_id, session);
    info!(%session_id, modules = snapshot.modules.len(), "session created");
    snapshot
}

/// # Errors
///
/// Returns `NotFound` if the session does not exist.
pub async fn get_session(state: &AppState, session_id: Uuid) -> Result<SessionSnapshot, SessionError> {
    with_session(state, session_id, |session| Ok(snapshot_of(session_id, session))).await
}

/// # Errors
///
/// Returns `NotFound` if the session does not exist.
pub async fn delete_session(state: &AppState, session_id: Uuid) -> Result<(), SessionError> {
    if state.sessions.write().await.remove(&session_id).is_none() {
        return Err(SessionError::NotFound(session_id));
    }
    info!(%session_id, "session deleted");
    Ok(())
}

/// Drop every session idle for at least `state.session_ttl`. Returns how
/// many were dropped.
pub async fn expire_idle_sessions(state: &AppState) -> usize {
    let now = Instant::now();
    let mut sessions = state.sessions.write().await;
    let before = sessions.len();
    sessions.retain(|session_id, session| {
        let idle = session.is_idle(now, state.session_ttl);
        if idle {
            info!(%session_id, "idle session expired");
        }
        !idle
    });
    before - sessions.len()
}

/// Spawn the background expiry sweep. Returns a handle for shutdown.
pub fn spawn_expiry_task(state: AppState, sweep_interval: Duration) -> JoinHandle<()> {
    info!(
        ttl_secs = state.session_ttl.as_secs(),
        sweep_secs = sweep_interval.as_secs(),
        "session expiry configured"
    );
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(sweep_interval).await;
            let expired = expire_idle_sessions(&state).await;
            if expired > 0 {
                let remaining = state.sessions.read().await.len();
                info!(expired, remaining, "idle sessions swept");
            }
        }
    })
}

// =============================================================================
// HOSTS & COMPATIBILITY
// =============================================================================

/// List hosts for the given groups. No groups, no backend call.
///
/// # Errors
///
/// Returns `HostsUnavailable` on backend failure.
pub async fn list_hosts(state: &AppState, group_ids: &[String]) -> Result<Vec<HostSummary>, SessionError> {
    if group_ids.is_empty() {
        return Ok(Vec::new());
    }
    state
        .backend
        .hosts_by_group(group_ids)
        .await
        .map_err(|e| SessionError::HostsUnavailable(e.to_string()))
}

/// Replace the host selection and re-evaluate module compatibility.
///
/// # Errors
///
/// Returns `NotFound` if the session does not exist (including when it is
/// deleted while the backend is consulted), or `ValidationUnavailable` if
/// this, the newest, request failed.
pub async fn evaluate_hosts(
    state: &AppState,
    session_id: Uuid,
    host_ids: Vec<String>,
) -> Result<HostEvaluation, SessionError> {
    let begun = with_session(state, session_id, |session| {
        Ok(session.compat.begin(host_ids).ok_or_else(|| evaluation_of(session, EvaluationOutcome::Applied)))
    })
    .await?;
    let ticket = match begun {
        Ok(ticket) => ticket,
        Err(cleared) => return Ok(cleared),
    };

    let result = state.backend.validate_modules(ticket.host_ids()).await;

    // Outcome, status and cards are read under the lock that applies the answer.
    with_session(state, session_id, |session| {
        let outcome = session.compat.complete(ticket, result, &session.catalog)?;
        Ok(evaluation_of(session, outcome))
    })
    .await
}

fn evaluation_of(session: &StudioSession, outcome: EvaluationOutcome) -> HostEvaluation {
    HostEvaluation {
        outcome,
        compatibility: session.compat.status().clone(),
        modules: session.compat.module_cards(&session.catalog),
    }
}

// =============================================================================
// LAYOUT
// =============================================================================

/// # Errors
///
/// Returns `NotFound`, `UnknownModule`, or `ModuleNotCompatible`.
pub async fn add_instance(state: &AppState, session_id: Uuid, module_key: &str) -> Result<InstanceChange, SessionError> {
    with_session(state, session_id, |session| {
        let instance = session.layout.add_instance(&session.catalog, &session.compat, module_key)?;
        Ok(InstanceChange { instance, document: session.layout.serialize() })
    })
    .await
}

/// # Errors
///
/// Returns `NotFound`, `InstanceNotFound`, or a config validation error.
pub async fn update_instance(
    state: &AppState,
    session_id: Uuid,
    instance_id: &str,
    title: Option<&str>,
    config: &serde_json::Value,
) -> Result<InstanceChange, SessionError> {
    with_session(state, session_id, |session| {
        let instance = session.layout.update_instance(&session.catalog, instance_id, title, config)?;
        Ok(InstanceChange { instance, document: session.layout.serialize() })
    })
    .await
}

/// # Errors
///
/// Returns `NotFound` or `InstanceNotFound`.
pub async fn remove_instance(state: &AppState, session_id: Uuid, instance_id: &str) -> Result<InstanceChange, SessionError> {
    with_session(state, session_id, |session| {
        let instance = session.layout.remove_instance(instance_id)?;
        Ok(InstanceChange { instance, document: session.layout.serialize() })
    })
    .await
}

/// # Errors
///
/// Returns `NotFound` or `ReorderMismatch`.
pub async fn reorder(state: &AppState, session_id: Uuid, order: &[String]) -> Result<Document, SessionError> {
    with_session(state, session_id, |session| {
        session.layout.reorder(order)?;
        Ok(session.layout.serialize())
    })
    .await
}

/// # Errors
///
/// Returns `NotFound` if the session does not exist.
pub async fn document(state: &AppState, session_id: Uuid) -> Result<Document, SessionError> {
    with_session(state, session_id, |session| Ok(session.layout.serialize())).await
}

/// Replace the session's layout with one rebuilt from `document`. The
/// current layout is kept if the document is rejected.
///
/// # Errors
///
/// Returns `NotFound`, `UnknownModule`, `DuplicateInstance`, or a config
/// validation error.
pub async fn restore_document(state: &AppState, session_id: Uuid, document: &Document) -> Result<Document, SessionError> {
    with_session(state, session_id, |session| {
        session.layout = LayoutDocument::deserialize(document, &session.catalog)?;
        let restored = session.layout.serialize();
        info!(%session_id, instances = restored.len(), "layout restored from document");
        Ok(restored)
    })
    .await
}

// =============================================================================
// REPORT
// =============================================================================

/// # Errors
///
/// Returns `NotFound` or a report validation error.
pub async fn build_report(state: &AppState, session_id: Uuid, options: ReportOptions) -> Result<ReportRequest, SessionError> {
    let request = with_session(state, session_id, |session| {
        Ok(report::build_request(options, session.compat.selection(), session.layout.serialize())?)
    })
    .await?;
    info!(%session_id, modules = request.modules.len(), hosts = request.hosts.len(), "report request built");
    Ok(request)
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
