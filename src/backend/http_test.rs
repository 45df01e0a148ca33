use super::*;
use crate::config::{BackendTimeouts, SessionExpiry, StudioConfig};

#[test]
fn parse_all_modules_reads_list() {
    let json = r#"{"all_modules":[{"key":"cpu","name":"CPU usage"},{"key":"memory","name":"Memory"}]}"#;
    let modules = parse_all_modules(json).unwrap();
    assert_eq!(modules.len(), 2);
    assert_eq!(modules[0], ModuleSummary { key: "cpu".into(), name: "CPU usage".into() });
    assert_eq!(modules[1].key, "memory");
}

#[test]
fn parse_all_modules_rejects_wrong_shape() {
    let err = parse_all_modules(r#"{"modules":[]}"#).unwrap_err();
    assert!(matches!(err, BackendError::Parse(_)));
}

#[test]
fn parse_all_modules_rejects_non_json() {
    let err = parse_all_modules("<html>login</html>").unwrap_err();
    assert!(matches!(err, BackendError::Parse(_)));
}

#[test]
fn parse_supported_modules_reads_list() {
    let json = r#"{"supported_modules":[{"key":"cpu","name":"CPU usage"}]}"#;
    let modules = parse_supported_modules(json).unwrap();
    assert_eq!(modules, vec![ModuleSummary { key: "cpu".into(), name: "CPU usage".into() }]);
}

#[test]
fn parse_supported_modules_empty_list() {
    let modules = parse_supported_modules(r#"{"supported_modules":[]}"#).unwrap();
    assert!(modules.is_empty());
}

#[test]
fn parse_supported_modules_surfaces_error_payload() {
    let err = parse_supported_modules(r#"{"error":"zabbix down"}"#).unwrap_err();
    assert!(matches!(err, BackendError::Reported(ref msg) if msg == "zabbix down"));
}

#[test]
fn parse_hosts_reads_list() {
    let json = r#"[{"id":"10084","name":"web-01"},{"id":"10085","name":"db-01"}]"#;
    let hosts = parse_hosts(json).unwrap();
    assert_eq!(hosts.len(), 2);
    assert_eq!(hosts[1], HostSummary { id: "10085".into(), name: "db-01".into() });
}

#[test]
fn parse_hosts_surfaces_error_payload() {
    let err = parse_hosts(r#"{"error":"no data source"}"#).unwrap_err();
    assert!(matches!(err, BackendError::Reported(ref msg) if msg == "no data source"));
}

#[test]
fn parse_hosts_rejects_garbage() {
    let err = parse_hosts(r#"{"hosts":1}"#).unwrap_err();
    assert!(matches!(err, BackendError::Parse(_)));
}

#[test]
fn backend_error_retryable_classification() {
    use crate::error::ErrorCode;

    assert!(BackendError::Request("timeout".into()).retryable());
    assert!(BackendError::Response { status: 503, body: String::new() }.retryable());
    assert!(!BackendError::Response { status: 404, body: String::new() }.retryable());
    assert!(!BackendError::Parse("bad".into()).retryable());
    assert_eq!(BackendError::Reported("x".into()).error_code(), "E_BACKEND_REPORTED");
}

#[test]
fn http_backend_joins_paths_onto_base_url() {
    let config = StudioConfig {
        backend_url: "http://backend.test".into(),
        bind_addr: "127.0.0.1".into(),
        port: 3000,
        timeouts: BackendTimeouts { request_secs: 5, connect_secs: 1 },
        sessions: SessionExpiry { idle_ttl_secs: 60, sweep_interval_secs: 10 },
    };
    let backend = HttpBackend::new(&config).unwrap();
    assert_eq!(backend.url(ALL_MODULES_PATH), "http://backend.test/api/get_all_modules");
}

fn test_backend() -> HttpBackend {
    let config = StudioConfig {
        backend_url: "http://backend.test".into(),
        ..StudioConfig::from_lookup(|_| None).unwrap()
    };
    HttpBackend::new(&config).unwrap()
}

#[test]
fn hosts_url_joins_groups_into_one_segment() {
    let url = test_backend().hosts_url(&["10".into(), "11".into()]).unwrap();
    assert_eq!(url.as_str(), "http://backend.test/api/get_hosts/10,11");
}

#[test]
fn hosts_url_keeps_traversal_inside_hosts_endpoint() {
    let url = test_backend().hosts_url(&["../../admin/users?x=1#frag".into()]).unwrap();
    assert!(url.path().starts_with("/api/get_hosts/"));
    assert!(!url.path().contains("/admin"));
    assert!(url.query().is_none());
    assert!(url.fragment().is_none());
}
