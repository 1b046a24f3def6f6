//! Environment access and the field-name mappings used by the resolver.

use std::collections::{BTreeMap, HashMap};

/// A source of environment variables.
///
/// Resolution reads the environment only through this trait, so tests can
/// supply a plain map instead of mutating the process environment.
pub trait EnvSource {
    fn var(&self, key: &str) -> Option<String>;

    /// Like [`var`](Self::var), but treats an empty value as unset.
    fn non_empty(&self, key: &str) -> Option<String> {
        self.var(key).filter(|v| !v.is_empty())
    }
}

/// Reads the real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl EnvSource for BTreeMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl<E: EnvSource + ?Sized> EnvSource for &E {
    fn var(&self, key: &str) -> Option<String> {
        (**self).var(key)
    }
}

/// The environment variable consulted for `field`: the prefix exactly as
/// given, followed by the upper-cased field name.
///
/// ```
/// assert_eq!(modality_config::env_var_name("TEST_", "str_val"), "TEST_STR_VAL");
/// ```
pub fn env_var_name(prefix: &str, field: &str) -> String {
    format!("{prefix}{}", field.to_uppercase())
}

/// The `[metadata]` key consulted for `field`.
///
/// ```
/// assert_eq!(modality_config::toml_key("base_str_val"), "base-str-val");
/// ```
pub fn toml_key(field: &str) -> String {
    field.replace('_', "-")
}
