//! Per-mutation parameter overrides and the read view mutators see.

use crate::param::MutatorParamDescriptor;
use modality_types::AttrValue;
use std::collections::BTreeMap;

/// Parameter values supplied with a mutation, keyed by parameter name.
///
/// May be empty, in which case every parameter reads as its default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamBinding {
    values: BTreeMap<String, AttrValue>,
}

impl ParamBinding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an override.
    pub fn with(mut self, name: &str, value: impl Into<AttrValue>) -> Self {
        self.values.insert(name.to_owned(), value.into());
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<AttrValue>) -> Option<AttrValue> {
        self.values.insert(name.to_owned(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl From<BTreeMap<String, AttrValue>> for ParamBinding {
    fn from(values: BTreeMap<String, AttrValue>) -> Self {
        Self { values }
    }
}

impl<K: Into<String>, V: Into<AttrValue>> FromIterator<(K, V)> for ParamBinding {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Current value of one parameter: the override when bound, else the
/// declared default.
pub fn get_param(
    descriptor: &MutatorParamDescriptor,
    binding: Option<&ParamBinding>,
) -> Option<AttrValue> {
    lookup(descriptor, binding).cloned()
}

fn lookup<'a>(
    descriptor: &'a MutatorParamDescriptor,
    binding: Option<&'a ParamBinding>,
) -> Option<&'a AttrValue> {
    binding
        .and_then(|b| b.get(descriptor.name()))
        .or(descriptor.default_value())
}

/// A holder's declared parameters paired with its current binding.
///
/// Only declared names are visible; an override for an undeclared name is
/// carried but never read.
#[derive(Debug, Clone, Copy)]
pub struct BoundParams<'a> {
    params: &'a [MutatorParamDescriptor],
    binding: Option<&'a ParamBinding>,
}

impl<'a> BoundParams<'a> {
    pub fn new(params: &'a [MutatorParamDescriptor], binding: Option<&'a ParamBinding>) -> Self {
        Self { params, binding }
    }

    /// Defaults only.
    pub fn unbound(params: &'a [MutatorParamDescriptor]) -> Self {
        Self::new(params, None)
    }

    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    pub fn descriptors(&self) -> &'a [MutatorParamDescriptor] {
        self.params
    }

    pub fn get(&self, name: &str) -> Option<&'a AttrValue> {
        let descriptor = self.params.iter().find(|p| p.name() == name)?;
        lookup(descriptor, self.binding)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(AttrValue::as_f64)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(AttrValue::as_i64)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(AttrValue::as_bool)
    }

    pub fn get_str(&self, name: &str) -> Option<&'a str> {
        self.get(name).and_then(AttrValue::as_str)
    }
}
