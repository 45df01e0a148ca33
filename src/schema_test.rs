use serde_json::json;

use super::*;

#[test]
fn cpu_key_selects_cpu_schema() {
    assert_eq!(ConfigSchema::for_module("cpu"), ConfigSchema::Cpu);
}

#[test]
fn other_keys_select_basic_schema() {
    assert_eq!(ConfigSchema::for_module("memory"), ConfigSchema::Basic);
    assert_eq!(ConfigSchema::for_module(""), ConfigSchema::Basic);
}

#[test]
fn every_schema_declares_new_page() {
    for schema in [ConfigSchema::Cpu, ConfigSchema::Basic] {
        let spec = schema.field(NEW_PAGE).unwrap();
        assert_eq!(spec.kind, FieldKind::Boolean);
        assert_eq!(spec.presence, Presence::Optional);
    }
}

#[test]
fn cpu_defaults_omit_conditional_value() {
    let defaults = ConfigSchema::Cpu.defaults();
    assert_eq!(defaults.to_value(), json!({"analysis": "average", "newPage": false}));
    assert!(!defaults.contains(CPU_TOP_N_VALUE));
}

#[test]
fn basic_defaults_only_carry_new_page() {
    assert_eq!(ConfigSchema::Basic.defaults().to_value(), json!({"newPage": false}));
}

#[test]
fn required_when_tracks_resolved_choice() {
    let spec = ConfigSchema::Cpu.field(CPU_TOP_N_VALUE).unwrap();
    let mut resolved = serde_json::Map::new();
    assert!(!spec.is_active(&resolved));
    resolved.insert(CPU_ANALYSIS.into(), json!("timeline"));
    assert!(!spec.is_active(&resolved));
    resolved.insert(CPU_ANALYSIS.into(), json!("top_n"));
    assert!(spec.is_active(&resolved));
}

#[test]
fn conditional_fields_depend_on_earlier_fields() {
    for schema in [ConfigSchema::Cpu, ConfigSchema::Basic] {
        let fields = schema.fields();
        for (idx, spec) in fields.iter().enumerate() {
            if let Presence::RequiredWhen { field, .. } = spec.presence {
                assert!(fields[..idx].iter().any(|earlier| earlier.name == field), "{} depends on later field", spec.name);
            }
        }
    }
}

#[test]
fn field_specs_serialize_for_form_builders() {
    let value = serde_json::to_value(ConfigSchema::Cpu.fields()).unwrap();
    assert_eq!(value[0]["name"], "analysis");
    assert_eq!(value[0]["kind"]["type"], "choice");
    assert_eq!(value[0]["default"], "average");
    assert_eq!(value[1]["presence"]["rule"], "required_when");
    assert_eq!(value[1]["presence"]["equals"], "top_n");
    assert_eq!(value[1]["default"], serde_json::Value::Null);
}
