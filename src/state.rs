//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the backend client and a map of live editing sessions. Each
//! session owns its own catalog snapshot, compatibility filter, and layout
//! document; sessions never share mutable state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use uuid::Uuid;

use crate::backend::StudioBackend;
use crate::catalog::ModuleCatalog;
use crate::compat::CompatibilityFilter;
use crate::layout::LayoutDocument;

// =============================================================================
// STUDIO SESSION
// =============================================================================

/// One user's report-editing context. Lives in memory until deleted or idle
/// for longer than the configured TTL.
#[derive(Debug)]
pub struct StudioSession {
    pub catalog: ModuleCatalog,
    /// Why the catalog is empty, when it failed to load.
    pub catalog_error: Option<String>,
    pub compat: CompatibilityFilter,
    pub layout: LayoutDocument,
    last_touched: Instant,
}

impl StudioSession {
    #[must_use]
    pub fn new(catalog: ModuleCatalog) -> Self {
        Self::build(catalog, None)
    }

    #[must_use]
    pub fn without_catalog(error: String) -> Self {
        Self::build(ModuleCatalog::empty(), Some(error))
    }

    fn build(catalog: ModuleCatalog, catalog_error: Option<String>) -> Self {
        Self {
            catalog,
            catalog_error,
            compat: CompatibilityFilter::new(),
            layout: LayoutDocument::new(),
            last_touched: Instant::now(),
        }
    }

    /// Mark the session as used now.
    pub fn touch(&mut self) {
        self.last_touched = Instant::now();
    }

    #[must_use]
    pub fn is_idle(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.last_touched) >= ttl
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn StudioBackend>,
    pub sessions: Arc<RwLock<HashMap<Uuid, StudioSession>>>,
    /// Sessions untouched for this long are dropped by the expiry sweep.
    pub session_ttl: Duration,
}

impl AppState {
    #[must_use]
    pub fn new(backend: Arc<dyn StudioBackend>, session_ttl: Duration) -> Self {
        Self { backend, sessions: Arc::new(RwLock::new(HashMap::new())), session_ttl }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_starts_empty() {
        let session = StudioSession::new(ModuleCatalog::empty());
        assert!(session.catalog_error.is_none());
        assert!(session.layout.is_empty());
        assert!(session.compat.selection().is_empty());
    }

    #[test]
    fn session_without_catalog_records_error() {
        let session = StudioSession::without_catalog("backend down".into());
        assert!(session.catalog.is_empty());
        assert_eq!(session.catalog_error.as_deref(), Some("backend down"));
    }

    #[tokio::test(start_paused = true)]
    async fn session_goes_idle_after_ttl_and_touch_resets_it() {
        let ttl = Duration::from_secs(60);
        let mut session = StudioSession::new(ModuleCatalog::empty());

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(!session.is_idle(Instant::now(), ttl));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(session.is_idle(Instant::now(), ttl));

        session.touch();
        assert!(!session.is_idle(Instant::now(), ttl));
    }
}
