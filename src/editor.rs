//! Instance config editor: validates a proposed config against its schema.
//!
//! DESIGN
//! ======
//! Validation walks the schema's field table in declaration order, building
//! the stored config as it goes. Conditional fields are evaluated against the
//! values already resolved, so a field whose condition does not hold is never
//! copied into the result: stale values are cleared, not merely hidden.
//!
//! Values arrive from HTML-style forms, so integers may come as strings or
//! as whole-valued floats. Anything that is not exactly an integer is a type
//! error; nothing is truncated.

use serde_json::{Map, Value};

use crate::schema::{ConfigSchema, FieldKind, FieldSpec, Presence, ValidatedConfig};

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown field: {field}")]
    UnknownField { field: String },
    #[error("missing required field: {field}")]
    MissingField { field: String },
    #[error("invalid type for field {field}: expected {expected}")]
    InvalidFieldType { field: String, expected: &'static str },
    #[error("invalid value for field {field}: {reason}")]
    InvalidFieldValue { field: String, reason: String },
}

impl crate::error::ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownField { .. } => "E_UNKNOWN_FIELD",
            Self::MissingField { .. } => "E_MISSING_FIELD",
            Self::InvalidFieldType { .. } => "E_INVALID_FIELD_TYPE",
            Self::InvalidFieldValue { .. } => "E_INVALID_FIELD_VALUE",
        }
    }
}

// =============================================================================
// VALIDATION
// =============================================================================

/// Validate `proposed` against the schema of `module_key`.
///
/// # Errors
///
/// Returns the first violation found: unknown fields are reported before
/// missing or malformed ones.
pub fn validate(module_key: &str, proposed: &Value) -> Result<ValidatedConfig, ConfigError> {
    validate_with_schema(ConfigSchema::for_module(module_key), proposed)
}

/// Validate `proposed` against an explicit schema.
///
/// # Errors
///
/// See [`validate`].
pub fn validate_with_schema(schema: ConfigSchema, proposed: &Value) -> Result<ValidatedConfig, ConfigError> {
    let Value::Object(fields) = proposed else {
        return Err(ConfigError::InvalidFieldType { field: "config".into(), expected: "object" });
    };

    if let Some(unknown) = fields.keys().find(|name| schema.field(name).is_none()) {
        return Err(ConfigError::UnknownField { field: unknown.clone() });
    }

    let mut resolved = Map::new();
    for spec in schema.fields() {
        if !spec.is_active(&resolved) {
            continue;
        }
        match fields.get(spec.name).filter(|v| !v.is_null()) {
            Some(raw) => {
                resolved.insert(spec.name.to_string(), coerce(spec, raw)?);
            }
            None => match spec.presence {
                Presence::Optional => {
                    if let Some(default) = spec.default.to_value() {
                        resolved.insert(spec.name.to_string(), default);
                    }
                }
                Presence::Required | Presence::RequiredWhen { .. } => {
                    return Err(ConfigError::MissingField { field: spec.name.to_string() });
                }
            },
        }
    }

    Ok(ValidatedConfig(resolved))
}

fn coerce(spec: &FieldSpec, raw: &Value) -> Result<Value, ConfigError> {
    match spec.kind {
        FieldKind::Integer { min } => {
            let n = coerce_integer(raw).ok_or_else(|| ConfigError::InvalidFieldType {
                field: spec.name.to_string(),
                expected: "integer",
            })?;
            if n < min {
                return Err(ConfigError::InvalidFieldValue {
                    field: spec.name.to_string(),
                    reason: format!("must be at least {min}"),
                });
            }
            Ok(Value::from(n))
        }
        FieldKind::Boolean => {
            let b = match raw {
                Value::Bool(b) => Some(*b),
                Value::String(s) => match s.trim() {
                    "true" => Some(true),
                    "false" => Some(false),
                    _ => None,
                },
                _ => None,
            };
            b.map(Value::Bool)
                .ok_or_else(|| ConfigError::InvalidFieldType { field: spec.name.to_string(), expected: "boolean" })
        }
        FieldKind::Choice { options } => {
            let Value::String(s) = raw else {
                return Err(ConfigError::InvalidFieldType { field: spec.name.to_string(), expected: "string" });
            };
            if !options.contains(&s.as_str()) {
                return Err(ConfigError::InvalidFieldValue {
                    field: spec.name.to_string(),
                    reason: format!("'{s}' is not one of {}", options.join(", ")),
                });
            }
            Ok(Value::String(s.clone()))
        }
    }
}

fn coerce_integer(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(exact_integer)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(exact_integer))
        }
        _ => None,
    }
}

#[allow(clippy::float_cmp, clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn exact_integer(f: f64) -> Option<i64> {
    if !f.is_finite() || f.fract() != 0.0 {
        return None;
    }
    if f < i64::MIN as f64 || f >= i64::MAX as f64 {
        return None;
    }
    Some(f as i64)
}

#[cfg(test)]
#[path = "editor_test.rs"]
mod tests;
