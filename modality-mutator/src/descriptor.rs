//! Mutator-level metadata and the full mutator description.

use crate::error::DescriptorError;
use crate::param::{MutatorParamBuilder, MutatorParamDescriptor, OrganizationCustomMetadata};
use modality_types::AttrValue;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One entry of a holder's declared attributes.
#[derive(Debug, Clone)]
pub enum ParamDecl {
    /// A mutator parameter.
    Param(MutatorParamBuilder),
    /// Any other attribute; skipped when collecting parameters.
    Other(String),
}

impl From<MutatorParamBuilder> for ParamDecl {
    fn from(builder: MutatorParamBuilder) -> Self {
        Self::Param(builder)
    }
}

/// A type whose instances carry mutator parameters.
///
/// ```
/// use modality_mutator::{MutatorParamDescriptor, ParamDecl, ParamHolder};
/// use modality_types::AttrType;
///
/// struct Jitter;
///
/// impl ParamHolder for Jitter {
///     fn declared_params() -> Vec<ParamDecl> {
///         vec![
///             MutatorParamDescriptor::builder("amount", AttrType::Float)
///                 .default_value(0.5)
///                 .into(),
///             ParamDecl::Other("seed".into()),
///         ]
///     }
/// }
/// ```
pub trait ParamHolder {
    fn declared_params() -> Vec<ParamDecl>;
}

impl ParamHolder for () {
    fn declared_params() -> Vec<ParamDecl> {
        Vec::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutatorLayer {
    Implementational,
    Operational,
    Environmental,
}

impl MutatorLayer {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Implementational => "implementational",
            Self::Operational => "operational",
            Self::Environmental => "environmental",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutatorStatefulness {
    /// Effects persist until the mutation is cleared.
    Permanent,
    /// Effects come and go while the mutation is active.
    Intermittent,
    /// Effects apply once.
    Transient,
}

impl MutatorStatefulness {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Permanent => "permanent",
            Self::Intermittent => "intermittent",
            Self::Transient => "transient",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutatorOperation {
    Delay,
    Duplicate,
    DropFraction,
    DropPositional,
    Disable,
    Enable,
    Corrupt,
    SetToValue,
    SubstituteNextValue,
    Reorder,
    Stimulate,
}

impl MutatorOperation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Delay => "delay",
            Self::Duplicate => "duplicate",
            Self::DropFraction => "drop_fraction",
            Self::DropPositional => "drop_positional",
            Self::Disable => "disable",
            Self::Enable => "enable",
            Self::Corrupt => "corrupt",
            Self::SetToValue => "set_to_value",
            Self::SubstituteNextValue => "substitute_next_value",
            Self::Reorder => "reorder",
            Self::Stimulate => "stimulate",
        }
    }
}

/// Descriptive metadata for a mutator. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutatorMetadata {
    pub name: Option<String>,
    pub description: Option<String>,
    pub layer: Option<MutatorLayer>,
    pub group: Option<String>,
    pub operation: Option<MutatorOperation>,
    pub statefulness: Option<MutatorStatefulness>,
    pub organization_custom_metadata: Option<OrganizationCustomMetadata>,
}

impl MutatorMetadata {
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_owned()),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_owned());
        self
    }

    pub fn with_layer(mut self, layer: MutatorLayer) -> Self {
        self.layer = Some(layer);
        self
    }

    pub fn with_group(mut self, group: &str) -> Self {
        self.group = Some(group.to_owned());
        self
    }

    pub fn with_operation(mut self, operation: MutatorOperation) -> Self {
        self.operation = Some(operation);
        self
    }

    pub fn with_statefulness(mut self, statefulness: MutatorStatefulness) -> Self {
        self.statefulness = Some(statefulness);
        self
    }

    pub fn with_organization_custom_metadata(mut self, metadata: OrganizationCustomMetadata) -> Self {
        self.organization_custom_metadata = Some(metadata);
        self
    }
}

/// Everything the backend is told about a mutator.
#[derive(Debug, Clone, PartialEq)]
pub struct MutatorDescriptor {
    metadata: MutatorMetadata,
    params: Vec<MutatorParamDescriptor>,
}

impl MutatorDescriptor {
    /// Builds a descriptor from explicit declarations, in order.
    pub fn new(
        metadata: MutatorMetadata,
        decls: impl IntoIterator<Item = ParamDecl>,
    ) -> Result<Self, DescriptorError> {
        let mut seen = HashSet::new();
        let mut params = Vec::new();
        for decl in decls {
            let ParamDecl::Param(builder) = decl else {
                continue;
            };
            let param = builder.build()?;
            if !seen.insert(param.name().to_owned()) {
                return Err(DescriptorError::DuplicateParam(param.name().to_owned()));
            }
            params.push(param);
        }
        Ok(Self { metadata, params })
    }

    pub fn metadata(&self) -> &MutatorMetadata {
        &self.metadata
    }

    pub fn params(&self) -> &[MutatorParamDescriptor] {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&MutatorParamDescriptor> {
        self.params.iter().find(|p| p.name() == name)
    }

    /// The flat `mutator.*` attribute set announced for this mutator.
    ///
    /// Mutator-level keys come first, then each parameter's keys in
    /// declaration order.
    pub fn description_attributes(&self) -> Vec<(String, AttrValue)> {
        let m = &self.metadata;
        let mut out = Vec::new();

        let scalar = [
            ("mutator.name", m.name.as_deref()),
            ("mutator.description", m.description.as_deref()),
            ("mutator.layer", m.layer.as_ref().map(MutatorLayer::name)),
            ("mutator.group", m.group.as_deref()),
            ("mutator.operation", m.operation.as_ref().map(MutatorOperation::name)),
            (
                "mutator.statefulness",
                m.statefulness.as_ref().map(MutatorStatefulness::name),
            ),
        ];
        for (key, value) in scalar {
            if let Some(v) = value {
                out.push((key.to_owned(), AttrValue::from(v)));
            }
        }

        if let Some(org) = &m.organization_custom_metadata {
            org.push_attributes("mutator.", &mut out);
        }

        for param in &self.params {
            out.extend(param.description_attributes());
        }
        out
    }
}

/// Describes the mutator whose parameters are declared by `H`.
pub fn describe_mutator<H: ParamHolder>(
    metadata: MutatorMetadata,
) -> Result<MutatorDescriptor, DescriptorError> {
    MutatorDescriptor::new(metadata, H::declared_params())
}
