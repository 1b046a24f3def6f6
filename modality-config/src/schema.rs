//! Field declarations for plugin settings and the inheritance-aware
//! flattening that turns a declaration chain into one ordered field list.

use crate::error::SchemaError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// The declared type of a configuration field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum FieldType {
    Text,
    Integer,
    Float,
    Bool,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Bool => "bool",
        })
    }
}

/// A concrete field value, always of one of the [`FieldType`]s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl FieldValue {
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::Text(_) => FieldType::Text,
            Self::Integer(_) => FieldType::Integer,
            Self::Float(_) => FieldType::Float,
            Self::Bool(_) => FieldType::Bool,
        }
    }

    pub(crate) fn to_toml(&self) -> toml::Value {
        match self {
            Self::Text(s) => toml::Value::String(s.clone()),
            Self::Integer(i) => toml::Value::Integer(*i),
            Self::Float(f) => toml::Value::Float(*f),
            Self::Bool(b) => toml::Value::Boolean(*b),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(i) => i.fmt(f),
            Self::Float(x) => x.fmt(f),
            Self::Bool(b) => b.fmt(f),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// One named, typed configuration field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// snake_case identifier, unique within a flattened schema.
    pub name: String,
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<FieldValue>,
}

impl FieldDescriptor {
    fn simple(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            default: None,
        }
    }

    /// Shorthand for a text field.
    pub fn text(name: &str) -> Self {
        Self::simple(name, FieldType::Text)
    }

    /// Shorthand for a signed integer field.
    pub fn integer(name: &str) -> Self {
        Self::simple(name, FieldType::Integer)
    }

    /// Shorthand for a floating-point field.
    pub fn float(name: &str) -> Self {
        Self::simple(name, FieldType::Float)
    }

    /// Shorthand for a boolean field.
    pub fn bool(name: &str) -> Self {
        Self::simple(name, FieldType::Bool)
    }

    /// Sets the value used when neither the environment nor the file
    /// supplies one.
    pub fn with_default(mut self, value: impl Into<FieldValue>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// A settings declaration: its own fields plus the declarations it extends.
///
/// ```
/// use modality_config::{FieldDescriptor, SchemaDecl};
///
/// let base = SchemaDecl::new("BaseConfig").field(FieldDescriptor::text("base_str_val"));
/// let decl = SchemaDecl::new("SimpleConfig")
///     .extends(base)
///     .field(FieldDescriptor::integer("int_val"));
/// assert_eq!(decl.bases().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDecl {
    name: String,
    fields: Vec<FieldDescriptor>,
    bases: Vec<SchemaDecl>,
}

impl SchemaDecl {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            bases: Vec::new(),
        }
    }

    /// Adds a base declaration. Bases are merged in the order they are added.
    pub fn extends(mut self, base: SchemaDecl) -> Self {
        self.bases.push(base);
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn bases(&self) -> &[SchemaDecl] {
        &self.bases
    }
}

/// The flattened, inheritance-resolved field list of a declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigSchema {
    fields: Vec<FieldDescriptor>,
}

impl ConfigSchema {
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

/// Typed plugin settings with a descriptor table.
///
/// The struct's serde field names must match the declared field names;
/// fields that may resolve to absent should be `Option<_>`.
pub trait PluginSettings: DeserializeOwned {
    fn schema() -> SchemaDecl;
}

struct Slot {
    descriptor: FieldDescriptor,
    origin: String,
}

/// Flattens a declaration and all of its bases into one ordered field list.
///
/// Bases are merged first, left to right; a field declared again by the
/// derived declaration replaces the base field entirely but keeps the
/// position of its first occurrence. Sibling bases that declare the same
/// field with different types are an error; with equal types the
/// first-listed base wins.
pub fn flatten(decl: &SchemaDecl) -> Result<ConfigSchema, SchemaError> {
    let fields = merge(decl)?.into_iter().map(|slot| slot.descriptor).collect();
    Ok(ConfigSchema { fields })
}

fn merge(decl: &SchemaDecl) -> Result<Vec<Slot>, SchemaError> {
    let mut merged: Vec<Slot> = Vec::new();

    for base in &decl.bases {
        for slot in merge(base)? {
            match merged
                .iter()
                .find(|s| s.descriptor.name == slot.descriptor.name)
            {
                Some(existing) if existing.descriptor.field_type != slot.descriptor.field_type => {
                    return Err(SchemaError::ConflictingField {
                        field: slot.descriptor.name,
                        first: existing.origin.clone(),
                        first_type: existing.descriptor.field_type,
                        second: slot.origin,
                        second_type: slot.descriptor.field_type,
                    });
                }
                Some(_) => {}
                None => merged.push(slot),
            }
        }
    }

    let mut own = HashSet::new();
    for field in &decl.fields {
        validate(decl, field)?;
        if !own.insert(field.name.as_str()) {
            return Err(SchemaError::DuplicateField {
                schema: decl.name.clone(),
                field: field.name.clone(),
            });
        }

        let slot = Slot {
            descriptor: field.clone(),
            origin: decl.name.clone(),
        };
        match merged
            .iter_mut()
            .find(|s| s.descriptor.name == field.name)
        {
            Some(existing) => *existing = slot,
            None => merged.push(slot),
        }
    }

    Ok(merged)
}

fn validate(decl: &SchemaDecl, field: &FieldDescriptor) -> Result<(), SchemaError> {
    if !is_field_identifier(&field.name) {
        return Err(SchemaError::InvalidFieldName {
            schema: decl.name.clone(),
            field: field.name.clone(),
        });
    }
    if let Some(default) = &field.default {
        if default.field_type() != field.field_type {
            return Err(SchemaError::DefaultTypeMismatch {
                field: field.name.clone(),
                expected: field.field_type,
                actual: default.field_type(),
            });
        }
    }
    Ok(())
}

fn is_field_identifier(name: &str) -> bool {
    let mut bytes = name.bytes();
    match bytes.next() {
        Some(b) if b.is_ascii_lowercase() || b == b'_' => {}
        _ => return false,
    }
    bytes.all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}
