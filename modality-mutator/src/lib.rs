//! Mutator parameter declarations and mutation lifecycle hosting.
//!
//! - [`MutatorParamDescriptor`]: a validated parameter declaration
//! - [`describe_mutator`]: collects a [`ParamHolder`]'s parameters into a
//!   [`MutatorDescriptor`], which renders the `mutator.*` description
//!   attributes
//! - [`ParamBinding`] / [`BoundParams`]: per-mutation overrides layered
//!   over declared defaults
//! - [`MutatorRegistry`]: hosts [`Mutator`] implementations and routes
//!   inject, clear and reset commands

mod binding;
mod descriptor;
mod error;
mod host;
mod param;

pub use binding::{get_param, BoundParams, ParamBinding};
pub use descriptor::{
    describe_mutator, MutatorDescriptor, MutatorLayer, MutatorMetadata, MutatorOperation,
    MutatorStatefulness, ParamDecl, ParamHolder,
};
pub use error::DescriptorError;
pub use host::{HostedMutator, Mutator, MutatorRegistry};
pub use param::{
    MutatorParamBuilder, MutatorParamDescriptor, OrganizationCustomMetadata,
    ValueDistributionKind, ValueDistributionScaling,
};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, DescriptorError>;
