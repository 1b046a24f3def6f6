//! Layered configuration for Modality reflector plugins.
//!
//! A plugin declares its settings as a [`SchemaDecl`] (optionally extending
//! base declarations). [`flatten`] turns that into a name-unique
//! [`ConfigSchema`], and the [`ConfigResolver`] binds every field from, in
//! order of precedence:
//! 1. the environment variable `<PREFIX><FIELD_NAME>`,
//! 2. the `[metadata]` table of the reflector config file named by
//!    `MODALITY_REFLECTOR_CONFIG` (keys use `-` instead of `_`),
//! 3. the declared default.
//!
//! [`PluginConfig`] wraps the resolved plugin settings together with the
//! common `[ingest]`/`[mutation]` sections and their environment overrides.

mod env;
mod error;
mod file;
mod logging;
mod plugin;
mod resolve;
mod schema;

pub use env::{env_var_name, toml_key, EnvSource, ProcessEnv};
pub use error::{ConfigError, SchemaError, ValueSource};
pub use file::{
    FileSection, IngestSection, MutationSection, MutatorAttributes, ReflectorConfigFile,
    TimelineAttributes, CONFIG_ENV_VAR,
};
pub use logging::init_tracing;
pub use plugin::PluginConfig;
pub use resolve::{resolve, ConfigResolver, ResolvedConfig};
pub use schema::{
    flatten, ConfigSchema, FieldDescriptor, FieldType, FieldValue, PluginSettings, SchemaDecl,
};
pub use url::Url;
