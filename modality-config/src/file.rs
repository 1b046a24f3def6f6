//! The reflector configuration file named by `MODALITY_REFLECTOR_CONFIG`.
//!
//! Only the `[ingest]`, `[mutation]` and `[metadata]` tables are read; any
//! other table a reflector writes into the same file is ignored.

use crate::env::EnvSource;
use crate::error::ConfigError;
use modality_types::AttrKeyEqValuePair;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;
use url::Url;

/// Environment variable holding the path of the reflector config file.
pub const CONFIG_ENV_VAR: &str = "MODALITY_REFLECTOR_CONFIG";

/// A flat table of plugin settings, i.e. the file's `[metadata]` table.
pub type FileSection = toml::Table;

/// The parts of a reflector config file a plugin consumes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReflectorConfigFile {
    pub ingest: Option<IngestSection>,
    pub mutation: Option<MutationSection>,
    pub metadata: FileSection,
}

/// Connection settings for the ingest protocol.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestSection {
    pub protocol_parent_url: Option<Url>,
    pub allow_insecure_tls: bool,
    pub protocol_child_port: Option<u16>,
    pub timeline_attributes: TimelineAttributes,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimelineAttributes {
    /// Attached to every timeline.
    pub additional_timeline_attributes: Vec<AttrKeyEqValuePair>,
    /// Attached to every timeline, replacing same-named attributes.
    pub override_timeline_attributes: Vec<AttrKeyEqValuePair>,
}

/// Connection settings for the mutation protocol.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutationSection {
    pub protocol_parent_url: Option<Url>,
    pub allow_insecure_tls: bool,
    pub mutator_attributes: MutatorAttributes,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutatorAttributes {
    pub additional_mutator_attributes: Vec<AttrKeyEqValuePair>,
    pub override_mutator_attributes: Vec<AttrKeyEqValuePair>,
}

// Raw file shape, converted into the types above after parsing.

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
struct RawFile {
    ingest: Option<RawIngest>,
    mutation: Option<RawMutation>,
    metadata: toml::Table,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
struct RawIngest {
    protocol_parent_url: Option<String>,
    allow_insecure_tls: bool,
    protocol_child_port: Option<u16>,
    additional_timeline_attributes: Vec<String>,
    override_timeline_attributes: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
struct RawMutation {
    protocol_parent_url: Option<String>,
    allow_insecure_tls: bool,
    additional_mutator_attributes: Vec<String>,
    override_mutator_attributes: Vec<String>,
}

impl ReflectorConfigFile {
    /// Parses config file content. `${NAME}` references inside attribute
    /// lists are substituted from `env`.
    pub fn parse(content: &str, env: &impl EnvSource) -> Result<Self, ConfigError> {
        Self::parse_from("<inline>", content, env)
    }

    /// Reads and parses the file at `path`.
    pub fn load_from(path: &Path, env: &impl EnvSource) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        let file = Self::parse_from(&path.display().to_string(), &content, env)?;
        info!("Loaded reflector config from {:?}", path);
        Ok(file)
    }

    /// Loads the file named by [`CONFIG_ENV_VAR`].
    ///
    /// Returns `Ok(None)` when the variable is unset or empty, or when the
    /// named file does not exist.
    pub fn from_env(env: &impl EnvSource) -> Result<Option<Self>, ConfigError> {
        let Some(path) = env.non_empty(CONFIG_ENV_VAR) else {
            info!("{} is not set, using environment and defaults only", CONFIG_ENV_VAR);
            return Ok(None);
        };

        let path = PathBuf::from(path);
        if !path.exists() {
            info!("No reflector config file found at {:?}", path);
            return Ok(None);
        }

        Self::load_from(&path, env).map(Some)
    }

    fn parse_from(
        origin: &str,
        content: &str,
        env: &impl EnvSource,
    ) -> Result<Self, ConfigError> {
        let raw: RawFile = toml::from_str(content).map_err(|source| ConfigError::Toml {
            origin: origin.to_owned(),
            source,
        })?;
        raw.refine(env)
    }
}

impl RawFile {
    fn refine(self, env: &impl EnvSource) -> Result<ReflectorConfigFile, ConfigError> {
        let ingest = match self.ingest {
            Some(raw) => Some(IngestSection {
                protocol_parent_url: checked_url("ingest", raw.protocol_parent_url)?,
                allow_insecure_tls: raw.allow_insecure_tls,
                protocol_child_port: raw.protocol_child_port,
                timeline_attributes: TimelineAttributes {
                    additional_timeline_attributes: attr_list(
                        "additional-timeline-attributes",
                        &raw.additional_timeline_attributes,
                        env,
                    )?,
                    override_timeline_attributes: attr_list(
                        "override-timeline-attributes",
                        &raw.override_timeline_attributes,
                        env,
                    )?,
                },
            }),
            None => None,
        };

        let mutation = match self.mutation {
            Some(raw) => Some(MutationSection {
                protocol_parent_url: checked_url("mutation", raw.protocol_parent_url)?,
                allow_insecure_tls: raw.allow_insecure_tls,
                mutator_attributes: MutatorAttributes {
                    additional_mutator_attributes: attr_list(
                        "additional-mutator-attributes",
                        &raw.additional_mutator_attributes,
                        env,
                    )?,
                    override_mutator_attributes: attr_list(
                        "override-mutator-attributes",
                        &raw.override_mutator_attributes,
                        env,
                    )?,
                },
            }),
            None => None,
        };

        Ok(ReflectorConfigFile {
            ingest,
            mutation,
            metadata: self.metadata,
        })
    }
}

fn attr_list(
    list: &str,
    entries: &[String],
    env: &impl EnvSource,
) -> Result<Vec<AttrKeyEqValuePair>, ConfigError> {
    entries
        .iter()
        .map(|s| {
            AttrKeyEqValuePair::parse_with_env(s, |name| env.var(name))
                .map_err(|e| ConfigError::Semantics(format!("Error in {list} member. {e}")))
        })
        .collect()
}

fn checked_url(section: &str, url: Option<String>) -> Result<Option<Url>, ConfigError> {
    url.map(|u| {
        parse_url(&u).map_err(|reason| {
            ConfigError::Semantics(format!(
                "{section}.protocol-parent-url could not be parsed. {reason}"
            ))
        })
    })
    .transpose()
}

/// Parses a protocol url. A host component is required.
pub(crate) fn parse_url(text: &str) -> Result<Url, String> {
    let url = Url::parse(text).map_err(|e| e.to_string())?;
    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(format!("'{text}' has no host component")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_urls() {
        let url = parse_url("modality-ingest-tls://auxon.io:9077").unwrap();
        assert_eq!(url.scheme(), "modality-ingest-tls");
        assert_eq!(url.host_str(), Some("auxon.io"));
        assert_eq!(url.port(), Some(9077));

        let v6 = parse_url("modality-ingest://[::1]:14182").unwrap();
        assert_eq!(v6.host().map(|h| h.to_string()).as_deref(), Some("[::1]"));
    }

    #[test]
    fn malformed_protocol_urls() {
        for text in [
            "localhost",
            "modality-ingest://",
            "://host",
            "modality-ingest://bad host",
        ] {
            assert!(parse_url(text).is_err(), "{text:?} should be rejected");
        }
    }
}
