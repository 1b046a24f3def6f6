//! Plugin configuration: the plugin's own settings plus the common ingest
//! and mutation connection settings, each with their standard
//! environment overrides.

use crate::env::{EnvSource, ProcessEnv};
use crate::error::ConfigError;
use crate::file::{parse_url, IngestSection, MutationSection, ReflectorConfigFile};
use crate::resolve::{ConfigResolver, ResolvedConfig};
use crate::schema::{PluginSettings, SchemaDecl};
use modality_types::AttrKeyEqValuePair;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;
use uuid::Uuid;

const INGEST_URL: &str = "MODALITY_INGEST_URL";
const MUTATION_URL: &str = "MODALITY_MUTATION_URL";
const HOST: &str = "MODALITY_HOST";
const ALLOW_INSECURE_TLS: &str = "MODALITY_ALLOW_INSECURE_TLS";
const CHILD_PORT: &str = "MODALITY_REFLECTOR_PROTOCOL_CHILD_PORT";
const ADDITIONAL_TIMELINE_ATTRIBUTES: &str = "ADDITIONAL_TIMELINE_ATTRIBUTES";
const OVERRIDE_TIMELINE_ATTRIBUTES: &str = "OVERRIDE_TIMELINE_ATTRIBUTES";
const ADDITIONAL_MUTATOR_ATTRIBUTES: &str = "ADDITIONAL_MUTATOR_ATTRIBUTES";
const RUN_ID: &str = "MODALITY_RUN_ID";
const TIME_DOMAIN: &str = "MODALITY_TIME_DOMAIN";
const CLIENT_TIMEOUT: &str = "MODALITY_CLIENT_TIMEOUT";

/// Fully reconciled plugin configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginConfig {
    pub ingest: IngestSection,
    pub mutation: MutationSection,
    /// The plugin-specific settings.
    pub plugin: ResolvedConfig,
    /// Backend connection timeout (`MODALITY_CLIENT_TIMEOUT`, seconds).
    pub client_timeout: Option<Duration>,
    /// Value for `timeline.run_id`; a fresh UUID unless `MODALITY_RUN_ID`
    /// is set.
    pub run_id: String,
    /// Value for `timeline.time_domain`, if `MODALITY_TIME_DOMAIN` is set.
    pub time_domain: Option<String>,
}

impl PluginConfig {
    /// Loads the config file named in `env` (if any), resolves `decl`
    /// against its `[metadata]` table and applies the common overrides.
    pub fn load(
        decl: &SchemaDecl,
        prefix: &str,
        env: &impl EnvSource,
    ) -> Result<Self, ConfigError> {
        let resolver = ConfigResolver::new(decl, prefix)?;
        let file = ReflectorConfigFile::from_env(env)?;

        let (mut ingest, mut mutation, plugin) = match file {
            Some(file) => (
                file.ingest.unwrap_or_default(),
                file.mutation.unwrap_or_default(),
                resolver.resolve(env, Some(&file.metadata))?,
            ),
            None => (
                IngestSection::default(),
                MutationSection::default(),
                resolver.resolve(env, None)?,
            ),
        };

        override_ingest(&mut ingest, env)?;
        override_mutation(&mut mutation, env)?;

        let run_id = env
            .non_empty(RUN_ID)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let client_timeout = match env.non_empty(CLIENT_TIMEOUT) {
            Some(v) => Some(parse_timeout(&v)?),
            None => None,
        };

        Ok(Self {
            ingest,
            mutation,
            plugin,
            client_timeout,
            run_id,
            time_domain: env.non_empty(TIME_DOMAIN),
        })
    }

    /// [`load`](Self::load) for a typed settings struct's declared schema.
    pub fn load_for<T: PluginSettings>(
        prefix: &str,
        env: &impl EnvSource,
    ) -> Result<Self, ConfigError> {
        Self::load(&T::schema(), prefix, env)
    }

    /// [`load`](Self::load) against the real process environment.
    pub fn load_from_process_env(decl: &SchemaDecl, prefix: &str) -> Result<Self, ConfigError> {
        Self::load(decl, prefix, &ProcessEnv)
    }

    /// The plugin settings as a typed struct.
    pub fn settings<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        self.plugin.clone().into_settings()
    }
}

fn override_ingest(ingest: &mut IngestSection, env: &impl EnvSource) -> Result<(), ConfigError> {
    if let Some(url) = env_url(env, INGEST_URL)? {
        debug!(url = %url, "ingest url from {}", INGEST_URL);
        ingest.protocol_parent_url = Some(url);
    } else if ingest.protocol_parent_url.is_none() {
        if let Some(host) = env.non_empty(HOST) {
            ingest.protocol_parent_url = Some(host_url("modality-ingest", &host)?);
        }
    }

    if let Some(b) = env_bool(env, ALLOW_INSECURE_TLS)? {
        ingest.allow_insecure_tls = b;
    }

    if let Some(port) = env.non_empty(CHILD_PORT) {
        ingest.protocol_child_port = Some(port.parse::<u16>().map_err(|e| {
            ConfigError::InvalidEnvVar {
                var: CHILD_PORT.to_owned(),
                value: port.clone(),
                reason: e.to_string(),
            }
        })?);
    }

    let attrs = &mut ingest.timeline_attributes;
    attrs
        .additional_timeline_attributes
        .extend(env_attr_list(env, ADDITIONAL_TIMELINE_ATTRIBUTES)?);
    attrs
        .override_timeline_attributes
        .extend(env_attr_list(env, OVERRIDE_TIMELINE_ATTRIBUTES)?);

    Ok(())
}

fn override_mutation(
    mutation: &mut MutationSection,
    env: &impl EnvSource,
) -> Result<(), ConfigError> {
    if let Some(url) = env_url(env, MUTATION_URL)? {
        mutation.protocol_parent_url = Some(url);
    } else if let Some(ingest_url) = env_url(env, INGEST_URL)? {
        mutation.protocol_parent_url = Some(mutation_url_for(&ingest_url)?);
    } else if mutation.protocol_parent_url.is_none() {
        if let Some(host) = env.non_empty(HOST) {
            mutation.protocol_parent_url = Some(host_url("modality-mutation", &host)?);
        }
    }

    if let Some(b) = env_bool(env, ALLOW_INSECURE_TLS)? {
        mutation.allow_insecure_tls = b;
    }

    mutation
        .mutator_attributes
        .additional_mutator_attributes
        .extend(env_attr_list(env, ADDITIONAL_MUTATOR_ATTRIBUTES)?);

    Ok(())
}

/// `localhost` is reached in plaintext, any other host over TLS.
fn host_url(base_scheme: &str, host: &str) -> Result<Url, ConfigError> {
    let text = if host == "localhost" {
        format!("{base_scheme}://{host}")
    } else {
        format!("{base_scheme}-tls://{host}")
    };
    parse_url(&text).map_err(|reason| invalid_env(HOST, host, reason))
}

/// Same host as the ingest url, mutation scheme of matching security.
/// Port and path are dropped.
fn mutation_url_for(ingest_url: &Url) -> Result<Url, ConfigError> {
    let scheme = if ingest_url.scheme() == "modality-ingest-tls" {
        "modality-mutation-tls"
    } else {
        "modality-mutation"
    };
    let host = ingest_url
        .host()
        .ok_or_else(|| invalid_env(INGEST_URL, ingest_url.as_str(), "no host component".into()))?;
    debug!(host = %host, "mutation url derived from {}", INGEST_URL);
    parse_url(&format!("{scheme}://{host}"))
        .map_err(|reason| invalid_env(INGEST_URL, ingest_url.as_str(), reason))
}

fn invalid_env(var: &str, value: &str, reason: String) -> ConfigError {
    ConfigError::InvalidEnvVar {
        var: var.to_owned(),
        value: value.to_owned(),
        reason,
    }
}

fn env_url(env: &impl EnvSource, var: &str) -> Result<Option<Url>, ConfigError> {
    env.non_empty(var)
        .map(|value| parse_url(&value).map_err(|reason| invalid_env(var, &value, reason)))
        .transpose()
}

fn env_bool(env: &impl EnvSource, var: &str) -> Result<Option<bool>, ConfigError> {
    let Some(value) = env.non_empty(var) else {
        return Ok(None);
    };
    if value.eq_ignore_ascii_case("true") {
        Ok(Some(true))
    } else if value.eq_ignore_ascii_case("false") {
        Ok(Some(false))
    } else {
        Err(ConfigError::InvalidEnvVar {
            var: var.to_owned(),
            value,
            reason: "expected true or false".to_owned(),
        })
    }
}

fn env_attr_list(
    env: &impl EnvSource,
    var: &str,
) -> Result<Vec<AttrKeyEqValuePair>, ConfigError> {
    let Some(value) = env.non_empty(var) else {
        return Ok(Vec::new());
    };
    value
        .split(',')
        .map(|entry| {
            AttrKeyEqValuePair::parse_with_env(entry, |name| env.var(name)).map_err(|e| {
                ConfigError::InvalidEnvVar {
                    var: var.to_owned(),
                    value: value.clone(),
                    reason: e.to_string(),
                }
            })
        })
        .collect()
}

fn parse_timeout(value: &str) -> Result<Duration, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar {
        var: CLIENT_TIMEOUT.to_owned(),
        value: value.to_owned(),
        reason,
    };
    let secs = value.parse::<f64>().map_err(|e| invalid(e.to_string()))?;
    Duration::try_from_secs_f64(secs).map_err(|e| invalid(e.to_string()))
}
