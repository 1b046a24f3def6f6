//! Core type definitions for the Modality plugin SDK.
//!
//! This crate defines the value types exchanged with the ingest and
//! mutation boundaries:
//! - Timeline, mutation and mutator identifiers (UUID v4)
//! - [`AttrValue`], the tagged attribute value, and its canonical formatter
//! - [`AttrKeyEqValuePair`], `key = value` attribute literals as written in
//!   config files and environment variables
//!
//! Transport, authentication and event submission live outside this crate.

mod attr;
mod ids;
mod pair;

pub use attr::{format_attr_val, format_json_attr_val, AttrType, AttrValue, EventCoordinate};
pub use ids::{MutationId, MutatorId, TimelineId};
pub use pair::{envsub, AttrKeyEqValuePair, AttrKeyValuePairParseError, EnvSubError};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("invalid attribute value: {0}")]
    InvalidAttrValue(String),

    #[error(transparent)]
    AttrPair(#[from] AttrKeyValuePairParseError),
}
