//! Binds every field of a flattened schema from the environment, the
//! config file's `[metadata]` table, or the declared default.

use crate::env::{env_var_name, toml_key, EnvSource};
use crate::error::{ConfigError, SchemaError, ValueSource};
use crate::file::FileSection;
use crate::schema::{
    flatten, ConfigSchema, FieldDescriptor, FieldType, FieldValue, PluginSettings, SchemaDecl,
};
use serde::de::DeserializeOwned;
use tracing::debug;

/// A flattened schema plus the environment prefix its fields are read
/// under. Build once at startup, then resolve as often as needed.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    schema: ConfigSchema,
    prefix: String,
}

impl ConfigResolver {
    pub fn new(decl: &SchemaDecl, prefix: &str) -> Result<Self, SchemaError> {
        Ok(Self {
            schema: flatten(decl)?,
            prefix: prefix.to_owned(),
        })
    }

    /// Resolver for a typed settings struct's declared schema.
    pub fn for_settings<T: PluginSettings>(prefix: &str) -> Result<Self, SchemaError> {
        Self::new(&T::schema(), prefix)
    }

    pub fn schema(&self) -> &ConfigSchema {
        &self.schema
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn resolve(
        &self,
        env: &impl EnvSource,
        file: Option<&FileSection>,
    ) -> Result<ResolvedConfig, ConfigError> {
        resolve(&self.schema, &self.prefix, env, file)
    }
}

/// Resolves `schema` against its three sources.
///
/// For each field, a non-empty `<prefix><FIELD>` environment variable wins
/// over the file's `field-name` key, which wins over the declared default.
/// The first value that cannot be coerced aborts the whole resolution.
pub fn resolve(
    schema: &ConfigSchema,
    prefix: &str,
    env: &impl EnvSource,
    file: Option<&FileSection>,
) -> Result<ResolvedConfig, ConfigError> {
    let mut bindings = Vec::with_capacity(schema.len());

    for field in schema.fields() {
        let var = env_var_name(prefix, &field.name);
        let key = toml_key(&field.name);

        let value = if let Some(text) = env.non_empty(&var) {
            debug!(field = %field.name, var = %var, "using environment value");
            Some(coerce_text(field, &text, ValueSource::Environment { var })?)
        } else if let Some(raw) = file.and_then(|section| section.get(&key)) {
            debug!(field = %field.name, key = %key, "using config file value");
            Some(coerce_toml(field, raw, key)?)
        } else if let Some(default) = &field.default {
            debug!(field = %field.name, "using declared default");
            Some(default.clone())
        } else {
            debug!(field = %field.name, "no value from any source");
            None
        };

        bindings.push((field.name.clone(), value));
    }

    Ok(ResolvedConfig { bindings })
}

fn mismatch(field: &FieldDescriptor, origin: ValueSource, value: String) -> ConfigError {
    ConfigError::TypeMismatch {
        field: field.name.clone(),
        expected: field.field_type,
        origin,
        value,
    }
}

fn coerce_text(
    field: &FieldDescriptor,
    text: &str,
    origin: ValueSource,
) -> Result<FieldValue, ConfigError> {
    let value = match field.field_type {
        FieldType::Text => Some(FieldValue::Text(text.to_owned())),
        FieldType::Integer => text.parse::<i64>().ok().map(FieldValue::Integer),
        FieldType::Float => text
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(FieldValue::Float),
        FieldType::Bool => {
            if text.eq_ignore_ascii_case("true") {
                Some(FieldValue::Bool(true))
            } else if text.eq_ignore_ascii_case("false") {
                Some(FieldValue::Bool(false))
            } else {
                None
            }
        }
    };
    value.ok_or_else(|| mismatch(field, origin, text.to_owned()))
}

fn coerce_toml(
    field: &FieldDescriptor,
    raw: &toml::Value,
    key: String,
) -> Result<FieldValue, ConfigError> {
    let origin = ValueSource::File { key };
    match (field.field_type, raw) {
        (_, toml::Value::String(s)) => coerce_text(field, s, origin),
        (FieldType::Integer, toml::Value::Integer(i)) => Ok(FieldValue::Integer(*i)),
        (FieldType::Float, toml::Value::Integer(i)) => Ok(FieldValue::Float(*i as f64)),
        (FieldType::Float, toml::Value::Float(f)) if f.is_finite() => Ok(FieldValue::Float(*f)),
        (FieldType::Bool, toml::Value::Boolean(b)) => Ok(FieldValue::Bool(*b)),
        (_, other) => Err(mismatch(field, origin, other.to_string())),
    }
}

/// The outcome of resolution: every schema field, in schema order, bound to
/// a value or absent.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    bindings: Vec<(String, Option<FieldValue>)>,
}

impl ResolvedConfig {
    /// The value bound to `name`; `None` when absent or not declared.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.bindings
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_ref())
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn get_float(&self, name: &str) -> Option<f64> {
        match self.get(name)? {
            FieldValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.iter().any(|(n, _)| n == name)
    }

    /// True when `name` is declared but no source supplied a value.
    pub fn is_absent(&self, name: &str) -> bool {
        self.bindings
            .iter()
            .any(|(n, v)| n == name && v.is_none())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&FieldValue>)> {
        self.bindings.iter().map(|(n, v)| (n.as_str(), v.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// The bound values keyed by field name. Absent fields are omitted.
    pub fn to_toml_table(&self) -> toml::Table {
        self.bindings
            .iter()
            .filter_map(|(n, v)| v.as_ref().map(|v| (n.clone(), v.to_toml())))
            .collect()
    }

    /// Deserializes the bound values into a typed settings struct.
    pub fn into_settings<T: DeserializeOwned>(self) -> Result<T, ConfigError> {
        let table: toml::Table = self
            .bindings
            .into_iter()
            .filter_map(|(n, v)| v.map(|v| (n, v.to_toml())))
            .collect();
        Ok(toml::Value::Table(table).try_into()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn field(ft: FieldType) -> FieldDescriptor {
        FieldDescriptor {
            name: "x".into(),
            field_type: ft,
            default: None,
        }
    }

    fn env_origin() -> ValueSource {
        ValueSource::Environment { var: "X".into() }
    }

    #[test]
    fn text_coercions() {
        assert_eq!(
            coerce_text(&field(FieldType::Integer), "-12", env_origin()).unwrap(),
            FieldValue::Integer(-12)
        );
        assert_eq!(
            coerce_text(&field(FieldType::Float), "2.5", env_origin()).unwrap(),
            FieldValue::Float(2.5)
        );
        assert_eq!(
            coerce_text(&field(FieldType::Bool), "TrUe", env_origin()).unwrap(),
            FieldValue::Bool(true)
        );
        assert_eq!(
            coerce_text(&field(FieldType::Text), " spaced ", env_origin()).unwrap(),
            FieldValue::Text(" spaced ".into())
        );
    }

    #[test]
    fn malformed_text_is_a_mismatch() {
        for (ft, text) in [
            (FieldType::Integer, "4.2"),
            (FieldType::Integer, " 42"),
            (FieldType::Float, "abc"),
            (FieldType::Float, "NaN"),
            (FieldType::Bool, "yes"),
        ] {
            assert!(matches!(
                coerce_text(&field(ft), text, env_origin()),
                Err(ConfigError::TypeMismatch { .. })
            ));
        }
    }

    #[test]
    fn toml_natives() {
        let k = || "x".to_owned();
        assert_eq!(
            coerce_toml(&field(FieldType::Float), &toml::Value::Integer(3), k()).unwrap(),
            FieldValue::Float(3.0)
        );
        assert_eq!(
            coerce_toml(&field(FieldType::Bool), &toml::Value::Boolean(false), k()).unwrap(),
            FieldValue::Bool(false)
        );
        assert_eq!(
            coerce_toml(&field(FieldType::Integer), &toml::Value::String("7".into()), k()).unwrap(),
            FieldValue::Integer(7)
        );
        assert!(coerce_toml(&field(FieldType::Integer), &toml::Value::Float(1.5), k()).is_err());
        assert!(coerce_toml(&field(FieldType::Text), &toml::Value::Integer(1), k()).is_err());
    }

    #[test]
    fn resolution_does_not_touch_sources() {
        let schema = flatten(&SchemaDecl::new("S").field(FieldDescriptor::text("a"))).unwrap();
        let env: BTreeMap<String, String> = [("P_A".to_owned(), "v".to_owned())].into();
        let before = env.clone();
        let first = resolve(&schema, "P_", &env, None).unwrap();
        let second = resolve(&schema, "P_", &env, None).unwrap();
        assert_eq!(first, second);
        assert_eq!(env, before);
    }
}
