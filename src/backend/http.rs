//! HTTP implementation of [`StudioBackend`].
//!
//! Thin reqwest wrapper over the analytics backend's JSON API. Body parsing
//! lives in pure `parse_*` functions for testability.

use std::time::Duration;

use serde::Deserialize;

use super::{BackendError, HostSummary, ModuleSummary, StudioBackend};
use crate::config::StudioConfig;

const ALL_MODULES_PATH: &str = "/api/get_all_modules";
const VALIDATE_MODULES_PATH: &str = "/api/validate_modules";
const HOSTS_PATH: &str = "/api/get_hosts";

// =============================================================================
// CLIENT
// =============================================================================

pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Build a backend client from service config.
    ///
    /// # Errors
    ///
    /// Returns `HttpClientBuild` if reqwest cannot construct the client.
    pub fn new(config: &StudioConfig) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| BackendError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.backend_url.clone() })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Group ids travel as one percent-encoded path segment, so no id can
    /// escape the hosts endpoint.
    fn hosts_url(&self, group_ids: &[String]) -> Result<reqwest::Url, BackendError> {
        let mut url = reqwest::Url::parse(&self.url(HOSTS_PATH)).map_err(|e| BackendError::Request(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| BackendError::Request(format!("backend URL cannot carry a path: {}", self.base_url)))?
            .push(&group_ids.join(","));
        Ok(url)
    }

    async fn read_body(response: reqwest::Response) -> Result<String, BackendError> {
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;
        if !(200..300).contains(&status) {
            // The hosts endpoint reports failures as `{error}` with a 500.
            if let Ok(ErrorBody { error }) = serde_json::from_str::<ErrorBody>(&text) {
                return Err(BackendError::Reported(error));
            }
            return Err(BackendError::Response { status, body: text });
        }
        Ok(text)
    }
}

#[async_trait::async_trait]
impl StudioBackend for HttpBackend {
    async fn all_modules(&self) -> Result<Vec<ModuleSummary>, BackendError> {
        let response = self
            .http
            .get(self.url(ALL_MODULES_PATH))
            .send()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;
        parse_all_modules(&Self::read_body(response).await?)
    }

    async fn validate_modules(&self, host_ids: &[String]) -> Result<Vec<ModuleSummary>, BackendError> {
        let response = self
            .http
            .post(self.url(VALIDATE_MODULES_PATH))
            .json(&ValidateRequest { host_ids })
            .send()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;
        parse_supported_modules(&Self::read_body(response).await?)
    }

    async fn hosts_by_group(&self, group_ids: &[String]) -> Result<Vec<HostSummary>, BackendError> {
        let url = self.hosts_url(group_ids)?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;
        parse_hosts(&Self::read_body(response).await?)
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(serde::Serialize)]
struct ValidateRequest<'a> {
    host_ids: &'a [String],
}

#[derive(Deserialize)]
struct AllModulesResponse {
    all_modules: Vec<ModuleSummary>,
}

#[derive(Deserialize)]
struct SupportedModulesResponse {
    supported_modules: Vec<ModuleSummary>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HostsResponse {
    Hosts(Vec<HostSummary>),
    Error(ErrorBody),
}

// =============================================================================
// PARSING
// =============================================================================

pub(crate) fn parse_all_modules(json: &str) -> Result<Vec<ModuleSummary>, BackendError> {
    let body: AllModulesResponse = serde_json::from_str(json).map_err(|e| BackendError::Parse(e.to_string()))?;
    Ok(body.all_modules)
}

pub(crate) fn parse_supported_modules(json: &str) -> Result<Vec<ModuleSummary>, BackendError> {
    if let Ok(ErrorBody { error }) = serde_json::from_str::<ErrorBody>(json) {
        return Err(BackendError::Reported(error));
    }
    let body: SupportedModulesResponse =
        serde_json::from_str(json).map_err(|e| BackendError::Parse(e.to_string()))?;
    Ok(body.supported_modules)
}

pub(crate) fn parse_hosts(json: &str) -> Result<Vec<HostSummary>, BackendError> {
    match serde_json::from_str::<HostsResponse>(json).map_err(|e| BackendError::Parse(e.to_string()))? {
        HostsResponse::Hosts(hosts) => Ok(hosts),
        HostsResponse::Error(ErrorBody { error }) => Err(BackendError::Reported(error)),
    }
}

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;
