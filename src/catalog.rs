//! Module catalog: the read-only set of known report modules.
//!
//! DESIGN
//! ======
//! Loaded once per editing session from the backend. A catalog that cannot
//! be loaded is reported as `CatalogUnavailable`; the session then carries
//! an empty catalog so nothing can be added, instead of failing outright.
//! There is no mutation API after load.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{info, warn};

use crate::backend::{ModuleSummary, StudioBackend};
use crate::schema::ConfigSchema;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("module catalog unavailable: {0}")]
    Unavailable(String),
}

impl crate::error::ErrorCode for CatalogError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "E_CATALOG_UNAVAILABLE",
        }
    }

    fn retryable(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleDefinition {
    pub key: String,
    pub display_name: String,
    pub config_schema: ConfigSchema,
}

#[derive(Debug, Clone, Default)]
pub struct ModuleCatalog {
    modules: Vec<ModuleDefinition>,
}

// =============================================================================
// LOAD
// =============================================================================

impl ModuleCatalog {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Fetch and validate the catalog from the backend.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable` on transport failure or a malformed payload.
    pub async fn load(backend: &dyn StudioBackend) -> Result<Self, CatalogError> {
        let summaries = backend
            .all_modules()
            .await
            .map_err(|e| CatalogError::Unavailable(e.to_string()))?;
        let catalog = Self::from_summaries(summaries)?;
        if catalog.is_empty() {
            warn!("backend advertised no modules; nothing can be added");
        }
        info!(count = catalog.len(), "module catalog loaded");
        Ok(catalog)
    }

    /// Build a catalog from backend summaries, preserving their order.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable` if a key is blank or repeated.
    pub fn from_summaries(summaries: Vec<ModuleSummary>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        let mut modules = Vec::with_capacity(summaries.len());
        for ModuleSummary { key, name } in summaries {
            if key.trim().is_empty() {
                return Err(CatalogError::Unavailable("module with empty key".into()));
            }
            if !seen.insert(key.clone()) {
                return Err(CatalogError::Unavailable(format!("duplicate module key: {key}")));
            }
            let config_schema = ConfigSchema::for_module(&key);
            modules.push(ModuleDefinition { key, display_name: name, config_schema });
        }
        Ok(Self { modules })
    }

    // =========================================================================
    // LOOKUP
    // =========================================================================

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ModuleDefinition> {
        self.modules.iter().find(|module| module.key == key)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModuleDefinition> {
        self.modules.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
