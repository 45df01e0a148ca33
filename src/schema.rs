//! Per-module configuration schemas.
//!
//! DESIGN
//! ======
//! A module's configuration shape is chosen once, from its key, as a
//! [`ConfigSchema`] variant. Each variant declares a static field table;
//! the editor walks that table instead of branching on module keys. Field
//! order matters: a conditional field may only depend on fields declared
//! before it.

use serde::Serialize;
use serde_json::{Map, Value};

/// Universal "start on new page" flag, accepted by every module.
pub const NEW_PAGE: &str = "newPage";

pub const CPU_ANALYSIS: &str = "analysis";
pub const CPU_TOP_N_VALUE: &str = "value";
pub const CPU_ANALYSIS_OPTIONS: &[&str] = &["average", "top_n", "timeline"];

// =============================================================================
// FIELD DECLARATIONS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    Integer { min: i64 },
    Boolean,
    Choice { options: &'static [&'static str] },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Presence {
    Required,
    Optional,
    /// Present and required only while `field` holds `equals`; dropped otherwise.
    RequiredWhen { field: &'static str, equals: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldDefault {
    None,
    Bool(bool),
    Text(&'static str),
}

impl FieldDefault {
    #[must_use]
    pub fn to_value(self) -> Option<Value> {
        match self {
            Self::None => None,
            Self::Bool(b) => Some(Value::Bool(b)),
            Self::Text(s) => Some(Value::String(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub presence: Presence,
    pub default: FieldDefault,
}

const NEW_PAGE_FIELD: FieldSpec = FieldSpec {
    name: NEW_PAGE,
    kind: FieldKind::Boolean,
    presence: Presence::Optional,
    default: FieldDefault::Bool(false),
};

const CPU_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: CPU_ANALYSIS,
        kind: FieldKind::Choice { options: CPU_ANALYSIS_OPTIONS },
        presence: Presence::Required,
        default: FieldDefault::Text("average"),
    },
    FieldSpec {
        name: CPU_TOP_N_VALUE,
        kind: FieldKind::Integer { min: 1 },
        presence: Presence::RequiredWhen { field: CPU_ANALYSIS, equals: "top_n" },
        default: FieldDefault::None,
    },
    NEW_PAGE_FIELD,
];

const BASIC_FIELDS: &[FieldSpec] = &[NEW_PAGE_FIELD];

// =============================================================================
// SCHEMA
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSchema {
    /// CPU usage analysis: average, top-N hosts, or daily timeline.
    Cpu,
    /// Modules without analysis-specific settings.
    Basic,
}

impl ConfigSchema {
    #[must_use]
    pub fn for_module(module_key: &str) -> Self {
        match module_key {
            "cpu" => Self::Cpu,
            _ => Self::Basic,
        }
    }

    #[must_use]
    pub fn fields(self) -> &'static [FieldSpec] {
        match self {
            Self::Cpu => CPU_FIELDS,
            Self::Basic => BASIC_FIELDS,
        }
    }

    #[must_use]
    pub fn field(self, name: &str) -> Option<&'static FieldSpec> {
        self.fields().iter().find(|spec| spec.name == name)
    }

    /// Config a freshly added instance starts with.
    #[must_use]
    pub fn defaults(self) -> ValidatedConfig {
        let mut config = Map::new();
        for spec in self.fields() {
            if !spec.is_active(&config) {
                continue;
            }
            if let Some(value) = spec.default.to_value() {
                config.insert(spec.name.to_string(), value);
            }
        }
        ValidatedConfig(config)
    }
}

impl FieldSpec {
    /// Whether this field applies given the fields resolved so far.
    #[must_use]
    pub fn is_active(&self, resolved: &Map<String, Value>) -> bool {
        match self.presence {
            Presence::Required | Presence::Optional => true,
            Presence::RequiredWhen { field, equals } => resolved.get(field).and_then(Value::as_str) == Some(equals),
        }
    }
}

// =============================================================================
// VALIDATED CONFIG
// =============================================================================

/// A configuration object that passed its module's schema. Only the editor
/// and [`ConfigSchema::defaults`] construct one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidatedConfig(pub(crate) Map<String, Value>);

impl ValidatedConfig {
    #[cfg(test)]
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    #[cfg(test)]
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

#[cfg(test)]
#[path = "schema_test.rs"]
mod tests;
