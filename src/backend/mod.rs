//! Backend collaborator: module catalog, module validation, host lookup.
//!
//! DESIGN
//! ======
//! The studio never owns host or module data. Everything it knows about
//! modules and hosts comes through the [`StudioBackend`] trait so sessions
//! can be driven by the real HTTP backend in production and by an
//! in-process mock in tests.

pub mod http;

use serde::{Deserialize, Serialize};

pub use http::HttpBackend;

// =============================================================================
// WIRE TYPES
// =============================================================================

/// A module as advertised by the backend: stable key plus display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSummary {
    pub key: String,
    pub name: String,
}

/// A monitored host belonging to one of the requested groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostSummary {
    pub id: String,
    pub name: String,
}

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The HTTP request never produced a response.
    #[error("backend request failed: {0}")]
    Request(String),

    /// The backend answered with a non-success status.
    #[error("backend response error: status {status}")]
    Response { status: u16, body: String },

    /// The response body did not have the expected shape.
    #[error("backend response parse failed: {0}")]
    Parse(String),

    /// The backend answered with an explicit `{error}` payload.
    #[error("backend reported an error: {0}")]
    Reported(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl crate::error::ErrorCode for BackendError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Request(_) => "E_BACKEND_REQUEST",
            Self::Response { .. } => "E_BACKEND_RESPONSE",
            Self::Parse(_) => "E_BACKEND_PARSE",
            Self::Reported(_) => "E_BACKEND_REPORTED",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Response { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// TRAIT
// =============================================================================

#[async_trait::async_trait]
pub trait StudioBackend: Send + Sync {
    /// Every module the backend knows about, in display order.
    async fn all_modules(&self) -> Result<Vec<ModuleSummary>, BackendError>;

    /// Modules usable for the given hosts.
    async fn validate_modules(&self, host_ids: &[String]) -> Result<Vec<ModuleSummary>, BackendError>;

    /// Hosts belonging to any of the given groups.
    async fn hosts_by_group(&self, group_ids: &[String]) -> Result<Vec<HostSummary>, BackendError>;
}
