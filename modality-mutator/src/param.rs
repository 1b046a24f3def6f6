//! Mutator parameter declarations.
//!
//! A [`MutatorParamDescriptor`] is assembled once through its builder,
//! validated, and is read-only afterwards. Every descriptor knows how to
//! render itself as `mutator.params.<name>.*` description attributes.

use crate::error::DescriptorError;
use modality_types::{AttrType, AttrValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub(crate) const PARAMS_PREFIX: &str = "mutator.params.";

/// Attribute key segments must be ASCII and contain no periods.
pub(crate) fn is_valid_key_segment(s: &str) -> bool {
    s.is_ascii() && !s.contains('.')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueDistributionKind {
    Continuous,
    Discrete,
}

impl ValueDistributionKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Continuous => "continuous",
            Self::Discrete => "discrete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueDistributionScaling {
    Linear,
    Complex,
    Circular,
}

impl ValueDistributionScaling {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Complex => "complex",
            Self::Circular => "circular",
        }
    }
}

/// Vendor-specific attributes, emitted under `<scope>.<segment>.<key>`.
#[derive(Debug, Clone, PartialEq)]
pub struct OrganizationCustomMetadata {
    organization_name_segment: String,
    attributes: BTreeMap<String, AttrValue>,
}

impl OrganizationCustomMetadata {
    pub fn new(
        organization_name_segment: &str,
        attributes: impl IntoIterator<Item = (String, AttrValue)>,
    ) -> Result<Self, DescriptorError> {
        if organization_name_segment.is_empty()
            || !is_valid_key_segment(organization_name_segment)
        {
            return Err(DescriptorError::InvalidOrganizationSegment(
                organization_name_segment.to_owned(),
            ));
        }
        Ok(Self {
            organization_name_segment: organization_name_segment.to_owned(),
            attributes: attributes.into_iter().collect(),
        })
    }

    pub fn organization_name_segment(&self) -> &str {
        &self.organization_name_segment
    }

    pub fn attributes(&self) -> &BTreeMap<String, AttrValue> {
        &self.attributes
    }

    /// Appends `<prefix><segment>.<key>` entries.
    pub(crate) fn push_attributes(&self, prefix: &str, out: &mut Vec<(String, AttrValue)>) {
        for (k, v) in &self.attributes {
            out.push((
                format!("{prefix}{}.{k}", self.organization_name_segment),
                v.clone(),
            ));
        }
    }
}

/// A validated mutator parameter declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct MutatorParamDescriptor {
    name: String,
    value_type: AttrType,
    description: Option<String>,
    value_min: Option<AttrValue>,
    value_max: Option<AttrValue>,
    default_value: Option<AttrValue>,
    least_effect_value: Option<AttrValue>,
    value_distribution_kind: Option<ValueDistributionKind>,
    value_distribution_scaling: Option<ValueDistributionScaling>,
    value_distribution_option_set: BTreeMap<String, AttrValue>,
    organization_custom_metadata: Option<OrganizationCustomMetadata>,
}

impl MutatorParamDescriptor {
    /// Starts declaring a parameter.
    ///
    /// ```
    /// use modality_mutator::MutatorParamDescriptor;
    /// use modality_types::AttrType;
    ///
    /// let p = MutatorParamDescriptor::builder("delay_ms", AttrType::Integer)
    ///     .value_min(0_i64)
    ///     .value_max(500_i64)
    ///     .default_value(10_i64)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(p.name(), "delay_ms");
    /// ```
    pub fn builder(name: &str, value_type: AttrType) -> MutatorParamBuilder {
        MutatorParamBuilder {
            inner: Self {
                name: name.to_owned(),
                value_type,
                description: None,
                value_min: None,
                value_max: None,
                default_value: None,
                least_effect_value: None,
                value_distribution_kind: None,
                value_distribution_scaling: None,
                value_distribution_option_set: BTreeMap::new(),
                organization_custom_metadata: None,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> AttrType {
        self.value_type
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn value_min(&self) -> Option<&AttrValue> {
        self.value_min.as_ref()
    }

    pub fn value_max(&self) -> Option<&AttrValue> {
        self.value_max.as_ref()
    }

    pub fn default_value(&self) -> Option<&AttrValue> {
        self.default_value.as_ref()
    }

    pub fn least_effect_value(&self) -> Option<&AttrValue> {
        self.least_effect_value.as_ref()
    }

    pub fn value_distribution_kind(&self) -> Option<ValueDistributionKind> {
        self.value_distribution_kind
    }

    pub fn value_distribution_scaling(&self) -> Option<ValueDistributionScaling> {
        self.value_distribution_scaling
    }

    pub fn value_distribution_option_set(&self) -> &BTreeMap<String, AttrValue> {
        &self.value_distribution_option_set
    }

    pub fn organization_custom_metadata(&self) -> Option<&OrganizationCustomMetadata> {
        self.organization_custom_metadata.as_ref()
    }

    /// The `mutator.params.<name>.*` attributes describing this parameter.
    pub fn description_attributes(&self) -> Vec<(String, AttrValue)> {
        let prefix = format!("{PARAMS_PREFIX}{}", self.name);
        let mut out = vec![
            (format!("{prefix}.name"), AttrValue::from(self.name.as_str())),
            (
                format!("{prefix}.value_type"),
                AttrValue::from(self.value_type.wire_name()),
            ),
        ];

        let optional = [
            ("description", self.description.as_deref().map(AttrValue::from)),
            ("value_min", self.value_min.clone()),
            ("value_max", self.value_max.clone()),
            ("default_value", self.default_value.clone()),
            ("least_effect_value", self.least_effect_value.clone()),
            (
                "value_distribution.kind",
                self.value_distribution_kind.map(|k| AttrValue::from(k.name())),
            ),
            (
                "value_distribution.scaling",
                self.value_distribution_scaling.map(|s| AttrValue::from(s.name())),
            ),
        ];
        for (suffix, value) in optional {
            if let Some(v) = value {
                out.push((format!("{prefix}.{suffix}"), v));
            }
        }

        for (k, v) in &self.value_distribution_option_set {
            out.push((format!("{prefix}.value_distribution.option_set.{k}"), v.clone()));
        }

        if let Some(org) = &self.organization_custom_metadata {
            org.push_attributes(&format!("{prefix}."), &mut out);
        }
        out
    }
}

/// Builder returned by [`MutatorParamDescriptor::builder`].
#[derive(Debug, Clone)]
pub struct MutatorParamBuilder {
    inner: MutatorParamDescriptor,
}

impl MutatorParamBuilder {
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn description(mut self, description: &str) -> Self {
        self.inner.description = Some(description.to_owned());
        self
    }

    pub fn value_min(mut self, min: impl Into<AttrValue>) -> Self {
        self.inner.value_min = Some(min.into());
        self
    }

    pub fn value_max(mut self, max: impl Into<AttrValue>) -> Self {
        self.inner.value_max = Some(max.into());
        self
    }

    pub fn default_value(mut self, value: impl Into<AttrValue>) -> Self {
        self.inner.default_value = Some(value.into());
        self
    }

    pub fn least_effect_value(mut self, value: impl Into<AttrValue>) -> Self {
        self.inner.least_effect_value = Some(value.into());
        self
    }

    pub fn value_distribution_kind(mut self, kind: ValueDistributionKind) -> Self {
        self.inner.value_distribution_kind = Some(kind);
        self
    }

    pub fn value_distribution_scaling(mut self, scaling: ValueDistributionScaling) -> Self {
        self.inner.value_distribution_scaling = Some(scaling);
        self
    }

    pub fn value_distribution_option(mut self, key: &str, value: impl Into<AttrValue>) -> Self {
        self.inner
            .value_distribution_option_set
            .insert(key.to_owned(), value.into());
        self
    }

    pub fn organization_custom_metadata(mut self, metadata: OrganizationCustomMetadata) -> Self {
        self.inner.organization_custom_metadata = Some(metadata);
        self
    }

    /// Validates the declaration.
    pub fn build(self) -> Result<MutatorParamDescriptor, DescriptorError> {
        let p = self.inner;

        if p.name.is_empty() || !is_valid_key_segment(&p.name) {
            return Err(DescriptorError::InvalidParamName(p.name));
        }

        if !matches!(
            p.value_type,
            AttrType::String | AttrType::Integer | AttrType::Float | AttrType::Bool
        ) {
            return Err(DescriptorError::UnsupportedValueType {
                name: p.name,
                value_type: p.value_type,
            });
        }

        if let Some(default) = &p.default_value {
            let actual = default.attr_type();
            if !fits(p.value_type, actual) {
                return Err(DescriptorError::DefaultTypeMismatch {
                    name: p.name,
                    expected: p.value_type,
                    actual,
                });
            }
        }

        if let (Some(min), Some(max)) = (&p.value_min, &p.value_max) {
            if bounds_inverted(min, max) {
                return Err(DescriptorError::InvalidBounds {
                    min: min.clone(),
                    max: max.clone(),
                    name: p.name,
                });
            }
        }

        Ok(p)
    }
}

/// Integer bounds compare exactly; anything else with a numeric view
/// compares as `f64`. Non-numeric bounds are never inverted.
fn bounds_inverted(min: &AttrValue, max: &AttrValue) -> bool {
    if let (Some(lo), Some(hi)) = (min.as_i64(), max.as_i64()) {
        return lo > hi;
    }
    match (min.as_f64(), max.as_f64()) {
        (Some(lo), Some(hi)) => lo > hi,
        _ => false,
    }
}

/// Integers are acceptable wherever a float is declared.
fn fits(declared: AttrType, actual: AttrType) -> bool {
    declared == actual || (declared == AttrType::Float && actual == AttrType::Integer)
}
