use uuid::Uuid;

use super::*;
use crate::compat::CompatibilityError;
use crate::editor::ConfigError;
use crate::report::ReportError;

#[test]
fn missing_session_and_instance_map_to_not_found() {
    assert_eq!(session_error_to_status(&SessionError::NotFound(Uuid::nil())), StatusCode::NOT_FOUND);
    let err = SessionError::Layout(LayoutError::InstanceNotFound("instance_cpu_x".into()));
    assert_eq!(session_error_to_status(&err), StatusCode::NOT_FOUND);
}

#[test]
fn state_conflicts_map_to_conflict() {
    let err = SessionError::Layout(LayoutError::ModuleNotCompatible("cpu".into()));
    assert_eq!(session_error_to_status(&err), StatusCode::CONFLICT);
    let err = SessionError::Layout(LayoutError::ReorderMismatch("length".into()));
    assert_eq!(session_error_to_status(&err), StatusCode::CONFLICT);
}

#[test]
fn user_input_errors_map_to_unprocessable() {
    let err = SessionError::Layout(LayoutError::Config(ConfigError::MissingField { field: "value".into() }));
    assert_eq!(session_error_to_status(&err), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(session_error_to_status(&SessionError::Report(ReportError::NoHosts)), StatusCode::UNPROCESSABLE_ENTITY);
}

#[test]
fn backend_failures_map_to_gateway_errors() {
    let err = SessionError::Compatibility(CompatibilityError::ValidationUnavailable("timeout".into()));
    assert_eq!(session_error_to_status(&err), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(session_error_to_status(&SessionError::HostsUnavailable("down".into())), StatusCode::BAD_GATEWAY);
}

#[test]
fn api_error_carries_code_and_retry_hint() {
    let err = ApiError::from(SessionError::HostsUnavailable("down".into()));
    assert_eq!(err.status, StatusCode::BAD_GATEWAY);
    assert_eq!(err.code, "E_HOSTS_UNAVAILABLE");
    assert!(err.retryable);

    let body = serde_json::to_value(&err).unwrap();
    assert_eq!(body["message"], "hosts unavailable: down");
    assert!(body.get("status").is_none());
}
