use modality_config::{
    ConfigError, ConfigResolver, FieldDescriptor, FieldValue, FileSection, PluginSettings,
    SchemaDecl, ValueSource,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde::Deserialize;
use std::collections::BTreeMap;

fn base_config() -> SchemaDecl {
    SchemaDecl::new("BaseConfig")
        .field(FieldDescriptor::text("base_str_val"))
        .field(FieldDescriptor::integer("base_int_val"))
        .field(FieldDescriptor::float("base_float_val"))
        .field(FieldDescriptor::bool("base_bool_val"))
}

#[derive(Debug, PartialEq, Deserialize)]
struct SimpleConfig {
    base_str_val: Option<String>,
    base_int_val: Option<i64>,
    base_float_val: Option<f64>,
    base_bool_val: Option<bool>,
    str_val: Option<String>,
    int_val: Option<i64>,
    float_val: Option<f64>,
    bool_val: Option<bool>,
}

impl PluginSettings for SimpleConfig {
    fn schema() -> SchemaDecl {
        SchemaDecl::new("SimpleConfig")
            .extends(base_config())
            .field(FieldDescriptor::text("str_val"))
            .field(FieldDescriptor::integer("int_val"))
            .field(FieldDescriptor::float("float_val"))
            .field(FieldDescriptor::bool("bool_val"))
    }
}

fn env(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn metadata(text: &str) -> FileSection {
    toml::from_str(text).unwrap()
}

fn resolver() -> ConfigResolver {
    ConfigResolver::for_settings::<SimpleConfig>("TEST_").unwrap()
}

// ── Environment ──────────────────────────────────────────────────

#[test]
fn nothing_set_resolves_all_absent() {
    let resolved = resolver().resolve(&env(&[]), None).unwrap();
    assert_eq!(resolved.len(), 8);
    for (name, value) in resolved.iter() {
        assert_eq!(value, None, "{name} should be absent");
    }
    assert!(resolved.is_absent("str_val"));
}

#[test]
fn derived_fields_from_env_leave_base_absent() {
    let e = env(&[("TEST_STR_VAL", "str"), ("TEST_INT_VAL", "42")]);
    let resolved = resolver().resolve(&e, None).unwrap();

    assert_eq!(resolved.get_str("str_val"), Some("str"));
    assert_eq!(resolved.get_int("int_val"), Some(42));
    assert!(resolved.is_absent("base_str_val"));
    assert!(resolved.is_absent("base_int_val"));
}

#[test]
fn all_fields_from_env_into_settings() {
    let e = env(&[
        ("TEST_STR_VAL", "str"),
        ("TEST_INT_VAL", "42"),
        ("TEST_FLOAT_VAL", "3.14"),
        ("TEST_BOOL_VAL", "true"),
        ("TEST_BASE_STR_VAL", "bstr"),
        ("TEST_BASE_INT_VAL", "420"),
        ("TEST_BASE_FLOAT_VAL", "30.14"),
        ("TEST_BASE_BOOL_VAL", "false"),
    ]);
    let settings: SimpleConfig = resolver().resolve(&e, None).unwrap().into_settings().unwrap();

    assert_eq!(
        settings,
        SimpleConfig {
            base_str_val: Some("bstr".into()),
            base_int_val: Some(420),
            base_float_val: Some(30.14),
            base_bool_val: Some(false),
            str_val: Some("str".into()),
            int_val: Some(42),
            float_val: Some(3.14),
            bool_val: Some(true),
        }
    );
}

#[test]
fn empty_env_value_is_absent() {
    let e = env(&[("TEST_STR_VAL", "")]);
    let file = metadata("str-val = 'from file'");
    let resolved = resolver().resolve(&e, Some(&file)).unwrap();
    assert_eq!(resolved.get_str("str_val"), Some("from file"));
}

#[test]
fn unprefixed_and_lowercase_vars_are_ignored() {
    let e = env(&[("STR_VAL", "x"), ("TEST_str_val", "y")]);
    let resolved = resolver().resolve(&e, None).unwrap();
    assert!(resolved.is_absent("str_val"));
}

// ── Precedence ───────────────────────────────────────────────────

#[test]
fn env_beats_file_beats_default() {
    let decl = SchemaDecl::new("P")
        .field(FieldDescriptor::text("a").with_default("default"))
        .field(FieldDescriptor::text("b").with_default("default"))
        .field(FieldDescriptor::text("c").with_default("default"));
    let file = metadata("a = 'file'\nb = 'file'");
    let e = env(&[("P_A", "env")]);

    let resolved = ConfigResolver::new(&decl, "P_")
        .unwrap()
        .resolve(&e, Some(&file))
        .unwrap();
    assert_eq!(resolved.get_str("a"), Some("env"));
    assert_eq!(resolved.get_str("b"), Some("file"));
    assert_eq!(resolved.get_str("c"), Some("default"));
}

#[test]
fn file_keys_use_hyphens() {
    let file = metadata("base-int-val = 7\nbase_float_val = 1.0");
    let resolved = resolver().resolve(&env(&[]), Some(&file)).unwrap();
    assert_eq!(resolved.get_int("base_int_val"), Some(7));
    assert!(resolved.is_absent("base_float_val"));
}

#[test]
fn file_natives_and_strings() {
    let file = metadata(
        "int-val = '12'\nfloat-val = 3\nbool-val = true\nbase-bool-val = 'FALSE'",
    );
    let resolved = resolver().resolve(&env(&[]), Some(&file)).unwrap();
    assert_eq!(resolved.get_int("int_val"), Some(12));
    assert_eq!(resolved.get("float_val"), Some(&FieldValue::Float(3.0)));
    assert_eq!(resolved.get_bool("bool_val"), Some(true));
    assert_eq!(resolved.get_bool("base_bool_val"), Some(false));
}

// ── Coercion failures ────────────────────────────────────────────

#[test]
fn non_numeric_env_integer_aborts() {
    let e = env(&[("TEST_STR_VAL", "fine"), ("TEST_INT_VAL", "forty-two")]);
    match resolver().resolve(&e, None) {
        Err(ConfigError::TypeMismatch {
            field,
            origin,
            value,
            ..
        }) => {
            assert_eq!(field, "int_val");
            assert_eq!(
                origin,
                ValueSource::Environment {
                    var: "TEST_INT_VAL".into()
                }
            );
            assert_eq!(value, "forty-two");
        }
        other => panic!("expected TypeMismatch, got {other:?}"),
    }
}

#[test]
fn file_type_mismatch_names_key() {
    let file = metadata("str-val = 5");
    let err = resolver().resolve(&env(&[]), Some(&file)).unwrap_err();
    assert_eq!(
        err.to_string(),
        "cannot use \"5\" from config file key metadata.str-val for field 'str_val': expected text"
    );
}

#[test]
fn bad_bool_text_is_a_mismatch() {
    let e = env(&[("TEST_BOOL_VAL", "1")]);
    assert!(matches!(
        resolver().resolve(&e, None),
        Err(ConfigError::TypeMismatch { .. })
    ));
}

#[test]
fn defaults_are_used_without_coercion() {
    let decl = SchemaDecl::new("D")
        .field(FieldDescriptor::integer("retries").with_default(3_i64))
        .field(FieldDescriptor::bool("verbose").with_default(false));
    let resolved = ConfigResolver::new(&decl, "D_")
        .unwrap()
        .resolve(&env(&[]), None)
        .unwrap();
    assert_eq!(resolved.get_int("retries"), Some(3));
    assert_eq!(resolved.get_bool("verbose"), Some(false));
    assert_eq!(resolved.to_toml_table().len(), 2);
}

// ── Properties ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn highest_present_source_wins(
        env_val in proptest::option::of(-1000_i64..1000),
        file_val in proptest::option::of(-1000_i64..1000),
        default_val in proptest::option::of(-1000_i64..1000),
    ) {
        let mut field = FieldDescriptor::integer("n");
        if let Some(d) = default_val {
            field = field.with_default(d);
        }
        let decl = SchemaDecl::new("Prop").field(field);

        let mut e = BTreeMap::new();
        if let Some(v) = env_val {
            e.insert("X_N".to_owned(), v.to_string());
        }
        let mut file = FileSection::new();
        if let Some(v) = file_val {
            file.insert("n".to_owned(), toml::Value::Integer(v));
        }

        let resolved = ConfigResolver::new(&decl, "X_").unwrap().resolve(&e, Some(&file)).unwrap();
        prop_assert_eq!(resolved.get_int("n"), env_val.or(file_val).or(default_val));
    }

    #[test]
    fn resolution_is_deterministic(value in "[a-z0-9 ]{1,16}") {
        let decl = SchemaDecl::new("Det").field(FieldDescriptor::text("s"));
        let resolver = ConfigResolver::new(&decl, "D_").unwrap();
        let e = env(&[("D_S", value.as_str())]);
        prop_assert_eq!(resolver.resolve(&e, None).unwrap(), resolver.resolve(&e, None).unwrap());
    }
}
