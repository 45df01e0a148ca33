//! Compatibility filter: which modules may be added for the selected hosts.
//!
//! DESIGN
//! ======
//! Evaluation is split in two halves so the caller can release its session
//! lock while the backend is consulted: [`CompatibilityFilter::begin`]
//! records the new host selection and hands out a ticket stamped with a
//! fresh generation number; [`CompatibilityFilter::complete`] applies a
//! backend answer only if its ticket still carries the newest generation.
//! Older answers are discarded on arrival, whatever order they arrive in.
//!
//! Compatibility gates the creation of instances only. Instances already in
//! the layout are never touched by a change in compatibility.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::backend::{BackendError, ModuleSummary};
use crate::catalog::ModuleCatalog;
use crate::schema::FieldSpec;

pub type HostSelection = BTreeSet<String>;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CompatibilityError {
    #[error("module validation unavailable: {0}")]
    ValidationUnavailable(String),
}

impl crate::error::ErrorCode for CompatibilityError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::ValidationUnavailable(_) => "E_VALIDATION_UNAVAILABLE",
        }
    }

    fn retryable(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CompatibilityStatus {
    /// No hosts selected; nothing is compatible.
    Idle,
    /// A backend request is in flight. Enablement still reflects the last applied result.
    Validating { generation: u64 },
    Ready,
    Unavailable { message: String },
}

/// Proof that a validation request was issued for a specific selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationTicket {
    generation: u64,
    host_ids: Vec<String>,
}

impl ValidationTicket {
    #[cfg(test)]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn host_ids(&self) -> &[String] {
        &self.host_ids
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationOutcome {
    Applied,
    Superseded,
}

/// A catalog entry as presented to the user, tagged with its enablement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleCard {
    pub key: String,
    pub name: String,
    pub enabled: bool,
    pub hint: String,
    pub config_fields: &'static [FieldSpec],
}

#[derive(Debug, Clone)]
pub struct CompatibilityFilter {
    selection: HostSelection,
    supported: BTreeSet<String>,
    generation: u64,
    status: CompatibilityStatus,
}

impl Default for CompatibilityFilter {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// EVALUATION
// =============================================================================

impl CompatibilityFilter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            selection: HostSelection::new(),
            supported: BTreeSet::new(),
            generation: 0,
            status: CompatibilityStatus::Idle,
        }
    }

    /// Record a new host selection. Returns a ticket when the backend must be
    /// consulted, or `None` when the selection is empty and the compatibility
    /// set has already been cleared.
    pub fn begin<I, S>(&mut self, host_ids: I) -> Option<ValidationTicket>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.generation += 1;
        self.selection = host_ids
            .into_iter()
            .map(|id| {
                let id: String = id.into();
                id.trim().to_string()
            })
            .filter(|id| !id.is_empty())
            .collect();

        if self.selection.is_empty() {
            self.supported.clear();
            self.status = CompatibilityStatus::Idle;
            debug!(generation = self.generation, "host selection cleared");
            return None;
        }

        self.status = CompatibilityStatus::Validating { generation: self.generation };
        info!(generation = self.generation, hosts = self.selection.len(), "validating module compatibility");
        Some(ValidationTicket { generation: self.generation, host_ids: self.selection.iter().cloned().collect() })
    }

    /// Apply the backend answer for `ticket`, unless a newer selection has
    /// been submitted since. The whole set is replaced in one step.
    ///
    /// # Errors
    ///
    /// Returns `ValidationUnavailable` when the newest request failed. The
    /// compatibility set is then empty until the selection is re-submitted.
    pub fn complete(
        &mut self,
        ticket: ValidationTicket,
        result: Result<Vec<ModuleSummary>, BackendError>,
        catalog: &ModuleCatalog,
    ) -> Result<EvaluationOutcome, CompatibilityError> {
        if ticket.generation != self.generation {
            debug!(stale = ticket.generation, current = self.generation, "discarding superseded validation result");
            return Ok(EvaluationOutcome::Superseded);
        }

        match result {
            Ok(modules) => {
                self.supported = modules
                    .into_iter()
                    .map(|m| m.key)
                    .filter(|key| {
                        let known = catalog.contains(key);
                        if !known {
                            debug!(%key, "ignoring supported module missing from catalog");
                        }
                        known
                    })
                    .collect();
                self.status = CompatibilityStatus::Ready;
                info!(generation = self.generation, supported = self.supported.len(), "module compatibility applied");
                Ok(EvaluationOutcome::Applied)
            }
            Err(e) => {
                let message = e.to_string();
                warn!(generation = self.generation, error = %message, "module validation failed");
                self.supported.clear();
                self.status = CompatibilityStatus::Unavailable { message: message.clone() };
                Err(CompatibilityError::ValidationUnavailable(message))
            }
        }
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    #[must_use]
    pub fn is_compatible(&self, module_key: &str) -> bool {
        self.supported.contains(module_key)
    }

    #[cfg(test)]
    #[must_use]
    pub fn compatibility_set(&self) -> &BTreeSet<String> {
        &self.supported
    }

    #[must_use]
    pub fn selection(&self) -> &HostSelection {
        &self.selection
    }

    #[must_use]
    pub fn status(&self) -> &CompatibilityStatus {
        &self.status
    }

    #[cfg(test)]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Catalog entries in catalog order, each tagged enabled or disabled.
    #[must_use]
    pub fn module_cards(&self, catalog: &ModuleCatalog) -> Vec<ModuleCard> {
        catalog
            .iter()
            .map(|module| {
                let enabled = self.is_compatible(&module.key);
                let hint = if enabled {
                    format!("Add \"{}\" to the report", module.display_name)
                } else {
                    "Select compatible hosts to enable this module".to_string()
                };
                ModuleCard {
                    key: module.key.clone(),
                    name: module.display_name.clone(),
                    enabled,
                    hint,
                    config_fields: module.config_schema.fields(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "compat_test.rs"]
mod tests;
