use modality_types::{AttrType, AttrValue, MutatorId};
use thiserror::Error;

/// Errors raised while declaring mutators or routing lifecycle calls.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DescriptorError {
    #[error("invalid parameter name {0:?}: must be non-empty ASCII without '.'")]
    InvalidParamName(String),

    #[error("parameter '{name}' has unsupported value type {value_type}")]
    UnsupportedValueType { name: String, value_type: AttrType },

    #[error("parameter '{name}' has value_min {min} greater than value_max {max}")]
    InvalidBounds {
        name: String,
        min: AttrValue,
        max: AttrValue,
    },

    #[error("parameter '{name}' declares a {actual} default for a {expected} parameter")]
    DefaultTypeMismatch {
        name: String,
        expected: AttrType,
        actual: AttrType,
    },

    #[error("parameter '{0}' is declared more than once")]
    DuplicateParam(String),

    #[error("invalid organization name segment {0:?}: must be ASCII without '.'")]
    InvalidOrganizationSegment(String),

    #[error("mutator {0} is not hosted here")]
    UnknownMutator(MutatorId),
}
