use super::*;
use crate::error::ErrorCode;
use crate::state::test_helpers::{MockBackend, summary};

#[test]
fn from_summaries_preserves_backend_order() {
    let catalog =
        ModuleCatalog::from_summaries(vec![summary("memory", "Memory"), summary("cpu", "CPU")]).unwrap();
    let keys: Vec<&str> = catalog.iter().map(|m| m.key.as_str()).collect();
    assert_eq!(keys, vec!["memory", "cpu"]);
    assert_eq!(catalog.len(), 2);
}

#[test]
fn from_summaries_assigns_schema_by_key() {
    let catalog =
        ModuleCatalog::from_summaries(vec![summary("cpu", "CPU"), summary("disk", "Disk")]).unwrap();
    assert_eq!(catalog.get("cpu").unwrap().config_schema, ConfigSchema::Cpu);
    assert_eq!(catalog.get("disk").unwrap().config_schema, ConfigSchema::Basic);
    assert_eq!(catalog.get("cpu").unwrap().display_name, "CPU");
}

#[test]
fn from_summaries_rejects_duplicate_keys() {
    let err = ModuleCatalog::from_summaries(vec![summary("cpu", "CPU"), summary("cpu", "CPU again")]).unwrap_err();
    assert!(matches!(err, CatalogError::Unavailable(ref msg) if msg.contains("duplicate")));
}

#[test]
fn from_summaries_rejects_blank_keys() {
    let err = ModuleCatalog::from_summaries(vec![summary("  ", "Blank")]).unwrap_err();
    assert!(matches!(err, CatalogError::Unavailable(_)));
}

#[test]
fn empty_catalog_contains_nothing() {
    let catalog = ModuleCatalog::empty();
    assert!(catalog.is_empty());
    assert!(!catalog.contains("cpu"));
    assert!(catalog.get("cpu").is_none());
}

#[tokio::test]
async fn load_reads_backend_modules() {
    let backend = MockBackend::with_modules(&[("cpu", "CPU")]);
    let catalog = ModuleCatalog::load(&backend).await.unwrap();
    assert!(catalog.contains("cpu"));
}

#[tokio::test]
async fn load_maps_backend_failure_to_unavailable() {
    let backend = MockBackend::with_modules(&[("cpu", "CPU")]).failing_catalog("connection refused");
    let err = ModuleCatalog::load(&backend).await.unwrap_err();
    assert!(matches!(err, CatalogError::Unavailable(ref msg) if msg.contains("connection refused")));
    assert_eq!(err.error_code(), "E_CATALOG_UNAVAILABLE");
    assert!(err.retryable());
}
