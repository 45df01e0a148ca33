//! Layout document: the ordered list of module instances in a report.
//!
//! DESIGN
//! ======
//! Instances live in a `Vec` whose order is the report's page order. Each
//! instance also carries its `position`, rewritten after every structural
//! change so positions are always the dense range `0..n` in vector order.
//! Every mutation validates fully before touching the vector; a failed call
//! leaves the document exactly as it was.
//!
//! The serialized [`Document`] is derived on demand from instance state and
//! never cached, so it cannot drift from the instances it describes.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::catalog::ModuleCatalog;
use crate::compat::CompatibilityFilter;
use crate::editor::{self, ConfigError};
use crate::error::ErrorCode;
use crate::schema::ValidatedConfig;

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("unknown module: {0}")]
    UnknownModule(String),
    #[error("module not compatible with the selected hosts: {0}")]
    ModuleNotCompatible(String),
    #[error("instance not found: {0}")]
    InstanceNotFound(String),
    #[error("reorder mismatch: {0}")]
    ReorderMismatch(String),
    #[error("duplicate instance id: {0}")]
    DuplicateInstance(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ErrorCode for LayoutError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownModule(_) => "E_UNKNOWN_MODULE",
            Self::ModuleNotCompatible(_) => "E_MODULE_NOT_COMPATIBLE",
            Self::InstanceNotFound(_) => "E_INSTANCE_NOT_FOUND",
            Self::ReorderMismatch(_) => "E_REORDER_MISMATCH",
            Self::DuplicateInstance(_) => "E_DUPLICATE_INSTANCE",
            Self::Config(e) => e.error_code(),
        }
    }
}

// =============================================================================
// INSTANCE
// =============================================================================

/// One placed occurrence of a module in the layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleInstance {
    instance_id: String,
    module_key: String,
    title: String,
    config: ValidatedConfig,
    position: usize,
}

impl ModuleInstance {
    #[cfg(test)]
    #[must_use]
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    #[cfg(test)]
    #[must_use]
    pub fn module_key(&self) -> &str {
        &self.module_key
    }

    #[cfg(test)]
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[cfg(test)]
    #[must_use]
    pub fn config(&self) -> &ValidatedConfig {
        &self.config
    }

    #[cfg(test)]
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    fn to_entry(&self) -> DocumentEntry {
        DocumentEntry {
            instance_id: self.instance_id.clone(),
            module_key: self.module_key.clone(),
            title: self.title.clone(),
            config: self.config.to_value(),
        }
    }
}

// =============================================================================
// SERIALIZED DOCUMENT
// =============================================================================

/// Wire form of one instance, as consumed by the report renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentEntry {
    pub instance_id: String,
    #[serde(rename = "type")]
    pub module_key: String,
    pub title: String,
    pub config: Value,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(pub Vec<DocumentEntry>);

impl Document {
    #[must_use]
    pub fn entries(&self) -> &[DocumentEntry] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// =============================================================================
// LAYOUT DOCUMENT
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct LayoutDocument {
    instances: Vec<ModuleInstance>,
}

impl LayoutDocument {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new instance of `module_key` with the module's default config.
    ///
    /// # Errors
    ///
    /// Returns `UnknownModule` if the key is not in the catalog, or
    /// `ModuleNotCompatible` if the current host selection does not support it.
    pub fn add_instance(
        &mut self,
        catalog: &ModuleCatalog,
        compat: &CompatibilityFilter,
        module_key: &str,
    ) -> Result<ModuleInstance, LayoutError> {
        let module = catalog
            .get(module_key)
            .ok_or_else(|| LayoutError::UnknownModule(module_key.to_string()))?;
        if !compat.is_compatible(module_key) {
            return Err(LayoutError::ModuleNotCompatible(module_key.to_string()));
        }

        let instance = ModuleInstance {
            instance_id: self.fresh_instance_id(module_key),
            module_key: module.key.clone(),
            title: module.display_name.clone(),
            config: module.config_schema.defaults(),
            position: self.instances.len(),
        };
        self.instances.push(instance.clone());
        info!(instance_id = %instance.instance_id, %module_key, position = instance.position, "instance added");
        Ok(instance)
    }

    /// Remove an instance and close the gap it leaves.
    ///
    /// # Errors
    ///
    /// Returns `InstanceNotFound` if no instance has `instance_id`.
    pub fn remove_instance(&mut self, instance_id: &str) -> Result<ModuleInstance, LayoutError> {
        let idx = self.index_of(instance_id)?;
        let removed = self.instances.remove(idx);
        self.renumber();
        info!(%instance_id, remaining = self.instances.len(), "instance removed");
        Ok(removed)
    }

    /// Put instances in exactly the supplied order.
    ///
    /// # Errors
    ///
    /// Returns `ReorderMismatch` unless `order` is a permutation of the
    /// current instance ids.
    pub fn reorder(&mut self, order: &[String]) -> Result<(), LayoutError> {
        if order.len() != self.instances.len() {
            return Err(LayoutError::ReorderMismatch(format!(
                "expected {} instance ids, got {}",
                self.instances.len(),
                order.len()
            )));
        }

        let current: HashMap<&str, usize> = self
            .instances
            .iter()
            .enumerate()
            .map(|(idx, inst)| (inst.instance_id.as_str(), idx))
            .collect();
        let mut seen = HashSet::with_capacity(order.len());
        let mut sequence = Vec::with_capacity(order.len());
        for id in order {
            let Some(&idx) = current.get(id.as_str()) else {
                return Err(LayoutError::ReorderMismatch(format!("unknown instance id: {id}")));
            };
            if !seen.insert(idx) {
                return Err(LayoutError::ReorderMismatch(format!("duplicate instance id: {id}")));
            }
            sequence.push(idx);
        }

        let mut slots: Vec<Option<ModuleInstance>> = std::mem::take(&mut self.instances).into_iter().map(Some).collect();
        self.instances = sequence.into_iter().filter_map(|idx| slots[idx].take()).collect();
        self.renumber();
        info!(count = self.instances.len(), "layout reordered");
        Ok(())
    }

    /// Replace an instance's title and config. Position is untouched.
    ///
    /// `None` keeps the current title; a blank title falls back to the
    /// module's display name.
    ///
    /// # Errors
    ///
    /// Returns `InstanceNotFound`, or the editor's `ConfigError` if the
    /// proposed config does not satisfy the module's schema.
    pub fn update_instance(
        &mut self,
        catalog: &ModuleCatalog,
        instance_id: &str,
        title: Option<&str>,
        config: &Value,
    ) -> Result<ModuleInstance, LayoutError> {
        let idx = self.index_of(instance_id)?;
        let instance = &mut self.instances[idx];
        let validated = editor::validate(&instance.module_key, config)?;

        if let Some(resolved) = title.and_then(|title| resolve_title(catalog, &instance.module_key, title)) {
            instance.title = resolved;
        }
        instance.config = validated;
        info!(%instance_id, module_key = %instance.module_key, "instance updated");
        Ok(instance.clone())
    }

    // =========================================================================
    // SERIALIZATION
    // =========================================================================

    /// Current state as the renderer's document. Pure; always fresh.
    #[must_use]
    pub fn serialize(&self) -> Document {
        Document(self.instances.iter().map(ModuleInstance::to_entry).collect())
    }

    /// Rebuild a layout from a document produced by [`LayoutDocument::serialize`].
    /// Compatibility is not consulted: it only gates new instances.
    ///
    /// # Errors
    ///
    /// Returns `UnknownModule` for keys missing from the catalog,
    /// `DuplicateInstance` for repeated ids, or the editor's error for an
    /// invalid config.
    pub fn deserialize(document: &Document, catalog: &ModuleCatalog) -> Result<Self, LayoutError> {
        let mut seen = HashSet::with_capacity(document.len());
        let mut instances = Vec::with_capacity(document.len());
        for (position, entry) in document.entries().iter().enumerate() {
            if !catalog.contains(&entry.module_key) {
                return Err(LayoutError::UnknownModule(entry.module_key.clone()));
            }
            if !seen.insert(entry.instance_id.as_str()) {
                return Err(LayoutError::DuplicateInstance(entry.instance_id.clone()));
            }
            let config = editor::validate(&entry.module_key, &entry.config)?;
            let title = resolve_title(catalog, &entry.module_key, &entry.title).unwrap_or_default();
            instances.push(ModuleInstance {
                instance_id: entry.instance_id.clone(),
                module_key: entry.module_key.clone(),
                title,
                config,
                position,
            });
        }
        Ok(Self { instances })
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    #[cfg(test)]
    #[must_use]
    pub fn instances(&self) -> &[ModuleInstance] {
        &self.instances
    }

    #[must_use]
    pub fn get(&self, instance_id: &str) -> Option<&ModuleInstance> {
        self.instances.iter().find(|inst| inst.instance_id == instance_id)
    }

    #[cfg(test)]
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    #[cfg(test)]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// True when positions are exactly `0..n` in sequence order.
    #[must_use]
    pub fn positions_are_dense(&self) -> bool {
        self.instances.iter().enumerate().all(|(idx, inst)| inst.position == idx)
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn index_of(&self, instance_id: &str) -> Result<usize, LayoutError> {
        self.instances
            .iter()
            .position(|inst| inst.instance_id == instance_id)
            .ok_or_else(|| LayoutError::InstanceNotFound(instance_id.to_string()))
    }

    fn renumber(&mut self) {
        for (idx, inst) in self.instances.iter_mut().enumerate() {
            inst.position = idx;
        }
        debug_assert!(self.positions_are_dense());
    }

    fn fresh_instance_id(&self, module_key: &str) -> String {
        loop {
            let id = format!("instance_{module_key}_{}", Uuid::new_v4().simple());
            if self.get(&id).is_none() {
                return id;
            }
        }
    }
}

/// Trimmed title, or the module's display name when the title is blank.
/// `None` only if the title is blank and the module is unknown.
fn resolve_title(catalog: &ModuleCatalog, module_key: &str, title: &str) -> Option<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        catalog.get(module_key).map(|m| m.display_name.clone())
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
#[path = "layout_test.rs"]
mod tests;
