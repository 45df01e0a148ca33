use super::*;
use crate::error::ErrorCode;
use crate::state::test_helpers::summary;

fn catalog() -> ModuleCatalog {
    ModuleCatalog::from_summaries(vec![summary("cpu", "CPU"), summary("memory", "Memory")]).unwrap()
}

fn supported(keys: &[&str]) -> Result<Vec<ModuleSummary>, BackendError> {
    Ok(keys.iter().map(|k| summary(k, k)).collect())
}

// =============================================================
// Empty selection
// =============================================================

#[test]
fn new_filter_is_idle_and_empty() {
    let filter = CompatibilityFilter::new();
    assert_eq!(filter.status(), &CompatibilityStatus::Idle);
    assert!(filter.compatibility_set().is_empty());
    assert_eq!(filter.generation(), 0);
}

#[test]
fn empty_selection_short_circuits() {
    let catalog = catalog();
    let mut filter = CompatibilityFilter::new();
    let ticket = filter.begin(["h1"]).unwrap();
    filter.complete(ticket, supported(&["cpu"]), &catalog).unwrap();
    assert!(filter.is_compatible("cpu"));

    assert!(filter.begin(Vec::<String>::new()).is_none());
    assert!(filter.compatibility_set().is_empty());
    assert_eq!(filter.status(), &CompatibilityStatus::Idle);
}

#[test]
fn blank_host_ids_count_as_empty() {
    let mut filter = CompatibilityFilter::new();
    assert!(filter.begin(["", "  "]).is_none());
    assert!(filter.selection().is_empty());
}

// =============================================================
// Apply
// =============================================================

#[test]
fn validating_does_not_change_enablement() {
    let catalog = catalog();
    let mut filter = CompatibilityFilter::new();
    let first = filter.begin(["h1"]).unwrap();
    filter.complete(first, supported(&["cpu"]), &catalog).unwrap();

    let second = filter.begin(["h2"]).unwrap();
    assert_eq!(filter.status(), &CompatibilityStatus::Validating { generation: second.generation() });
    assert!(filter.is_compatible("cpu"));
    assert!(!filter.is_compatible("memory"));
}

#[test]
fn applied_result_disables_missing_keys() {
    let catalog = catalog();
    let mut filter = CompatibilityFilter::new();
    let ticket = filter.begin(["h1", "h2"]).unwrap();
    assert_eq!(ticket.host_ids(), ["h1".to_string(), "h2".to_string()]);

    let outcome = filter.complete(ticket, supported(&["memory"]), &catalog).unwrap();
    assert_eq!(outcome, EvaluationOutcome::Applied);
    assert_eq!(filter.status(), &CompatibilityStatus::Ready);

    let cards = filter.module_cards(&catalog);
    assert_eq!(cards.len(), 2);
    assert_eq!(cards[0].key, "cpu");
    assert!(!cards[0].enabled);
    assert!(cards[1].enabled);
    assert!(cards[1].hint.contains("Memory"));
}

#[test]
fn keys_missing_from_catalog_are_ignored() {
    let catalog = catalog();
    let mut filter = CompatibilityFilter::new();
    let ticket = filter.begin(["h1"]).unwrap();
    filter.complete(ticket, supported(&["cpu", "gpu"]), &catalog).unwrap();
    assert_eq!(filter.compatibility_set().iter().collect::<Vec<_>>(), vec!["cpu"]);
}

#[test]
fn selection_is_deduplicated_and_sorted() {
    let mut filter = CompatibilityFilter::new();
    let ticket = filter.begin(["h2", "h1", "h2"]).unwrap();
    assert_eq!(ticket.host_ids(), ["h1".to_string(), "h2".to_string()]);
}

// =============================================================
// Last request wins
// =============================================================

#[test]
fn stale_result_arriving_last_is_discarded() {
    let catalog = catalog();
    let mut filter = CompatibilityFilter::new();
    let first = filter.begin(["A"]).unwrap();
    let second = filter.begin(["A", "B"]).unwrap();

    let outcome = filter.complete(second, supported(&["cpu", "memory"]), &catalog).unwrap();
    assert_eq!(outcome, EvaluationOutcome::Applied);
    let outcome = filter.complete(first, supported(&[]), &catalog).unwrap();
    assert_eq!(outcome, EvaluationOutcome::Superseded);

    assert!(filter.is_compatible("cpu"));
    assert!(filter.is_compatible("memory"));
    assert_eq!(filter.status(), &CompatibilityStatus::Ready);
}

#[test]
fn stale_result_arriving_first_is_discarded() {
    let catalog = catalog();
    let mut filter = CompatibilityFilter::new();
    let first = filter.begin(["A"]).unwrap();
    let second = filter.begin(["A", "B"]).unwrap();

    let outcome = filter.complete(first, supported(&["cpu", "memory"]), &catalog).unwrap();
    assert_eq!(outcome, EvaluationOutcome::Superseded);
    assert!(filter.compatibility_set().is_empty());
    assert!(matches!(filter.status(), CompatibilityStatus::Validating { .. }));

    filter.complete(second, supported(&["memory"]), &catalog).unwrap();
    assert!(!filter.is_compatible("cpu"));
    assert!(filter.is_compatible("memory"));
}

#[test]
fn result_arriving_after_selection_cleared_is_discarded() {
    let catalog = catalog();
    let mut filter = CompatibilityFilter::new();
    let ticket = filter.begin(["A"]).unwrap();
    assert!(filter.begin(Vec::<String>::new()).is_none());

    let outcome = filter.complete(ticket, supported(&["cpu"]), &catalog).unwrap();
    assert_eq!(outcome, EvaluationOutcome::Superseded);
    assert!(filter.compatibility_set().is_empty());
}

// =============================================================
// Failures
// =============================================================

#[test]
fn failure_of_newest_request_clears_set() {
    let catalog = catalog();
    let mut filter = CompatibilityFilter::new();
    let ticket = filter.begin(["A"]).unwrap();
    filter.complete(ticket, supported(&["cpu"]), &catalog).unwrap();

    let ticket = filter.begin(["B"]).unwrap();
    let err = filter
        .complete(ticket, Err(BackendError::Request("timed out".into())), &catalog)
        .unwrap_err();
    assert_eq!(err.error_code(), "E_VALIDATION_UNAVAILABLE");
    assert!(err.retryable());
    assert!(filter.compatibility_set().is_empty());
    assert!(matches!(filter.status(), CompatibilityStatus::Unavailable { message } if message.contains("timed out")));
}

#[test]
fn failure_of_superseded_request_is_discarded() {
    let catalog = catalog();
    let mut filter = CompatibilityFilter::new();
    let first = filter.begin(["A"]).unwrap();
    let second = filter.begin(["B"]).unwrap();
    filter.complete(second, supported(&["cpu"]), &catalog).unwrap();

    let outcome = filter
        .complete(first, Err(BackendError::Request("reset".into())), &catalog)
        .unwrap();
    assert_eq!(outcome, EvaluationOutcome::Superseded);
    assert!(filter.is_compatible("cpu"));
    assert_eq!(filter.status(), &CompatibilityStatus::Ready);
}
