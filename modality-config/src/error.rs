//! Error types for schema flattening and configuration resolution.

use crate::schema::FieldType;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A settings declaration is malformed. These are authoring bugs and are
/// never resolved silently.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error(
        "field '{field}' is declared by both '{first}' ({first_type}) and '{second}' ({second_type})"
    )]
    ConflictingField {
        field: String,
        first: String,
        first_type: FieldType,
        second: String,
        second_type: FieldType,
    },

    #[error("field '{field}' is declared more than once in '{schema}'")]
    DuplicateField { schema: String, field: String },

    #[error("invalid field name '{field}' in '{schema}'")]
    InvalidFieldName { schema: String, field: String },

    #[error("default for field '{field}' is {actual}, but the field is declared {expected}")]
    DefaultTypeMismatch {
        field: String,
        expected: FieldType,
        actual: FieldType,
    },
}

/// Where a candidate value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    Environment { var: String },
    File { key: String },
}

impl fmt::Display for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Environment { var } => write!(f, "environment variable {var}"),
            Self::File { key } => write!(f, "config file key metadata.{key}"),
        }
    }
}

/// Errors that can occur while loading or resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot use {value:?} from {origin} for field '{field}': expected {expected}")]
    TypeMismatch {
        field: String,
        expected: FieldType,
        origin: ValueSource,
        value: String,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {origin}: {source}")]
    Toml {
        origin: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value {value:?} for environment variable {var}: {reason}")]
    InvalidEnvVar {
        var: String,
        value: String,
        reason: String,
    },

    #[error("{0}")]
    Semantics(String),

    #[error("resolved settings do not fit the target type: {0}")]
    Settings(#[from] toml::de::Error),
}
