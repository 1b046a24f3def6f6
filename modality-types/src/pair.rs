//! `key = value` attribute literals, e.g. `run.label = "nightly"` or
//! `retries = 3`, with `${NAME}` environment substitution.

use crate::AttrValue;
use regex_lite::{Captures, Regex};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// `${NAME}`, `${NAME-default}` or `${NAME:-default}`.
static ENVSUB_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{(?P<var>[a-zA-Z_][a-zA-Z0-9_]*)(:?-(?P<def>.*?))?\}")
        .expect("envsub pattern is valid")
});

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EnvSubError {
    #[error("The environment variable '{0}' is not set and no default value is specified")]
    NotPresent(String),
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AttrKeyValuePairParseError {
    #[error("'{0}' is not a valid attribute key=value string.")]
    Format(String),

    #[error("The key '{0}' starts with an invalid character.")]
    InvalidKey(String),

    #[error(transparent)]
    EnvSub(#[from] EnvSubError),
}

/// Expands `${NAME}`, `${NAME-default}` and `${NAME:-default}`.
///
/// Both default forms apply only when the variable is unset. Text that is
/// not a well-formed expression is kept as written.
pub fn envsub(
    input: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String, EnvSubError> {
    replace_all(&ENVSUB_RE, input, |caps| {
        let var = &caps["var"];
        match (lookup(var), caps.name("def")) {
            (Some(value), _) => Ok(value),
            (None, Some(def)) => Ok(def.as_str().to_owned()),
            (None, None) => Err(EnvSubError::NotPresent(var.to_owned())),
        }
    })
}

/// `Regex::replace_all` with a fallible replacement.
fn replace_all(
    re: &Regex,
    input: &str,
    replacement: impl Fn(&Captures<'_>) -> Result<String, EnvSubError>,
) -> Result<String, EnvSubError> {
    let mut out = String::with_capacity(input.len());
    let mut last = 0;
    for caps in re.captures_iter(input) {
        let Some(m) = caps.get(0) else { continue };
        out.push_str(&input[last..m.start()]);
        out.push_str(&replacement(&caps)?);
        last = m.end();
    }
    out.push_str(&input[last..]);
    Ok(out)
}

/// An attribute key paired with a literal value.
#[derive(Clone, Debug, PartialEq)]
pub struct AttrKeyEqValuePair(pub String, pub AttrValue);

impl AttrKeyEqValuePair {
    pub fn key(&self) -> &str {
        &self.0
    }

    pub fn value(&self) -> &AttrValue {
        &self.1
    }

    /// Parses `key = value`, resolving substitutions through `lookup`.
    pub fn parse_with_env(
        input: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AttrKeyValuePairParseError> {
        let s = envsub(input, lookup)?;

        let parts: Vec<&str> = s.trim().split('=').map(str::trim).collect();
        if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
            return Err(AttrKeyValuePairParseError::Format(s));
        }

        let key = parts[0];
        if key.starts_with('.') {
            return Err(AttrKeyValuePairParseError::InvalidKey(key.to_owned()));
        }

        Ok(Self(key.to_owned(), AttrValue::infer(parts[1])))
    }
}

impl FromStr for AttrKeyEqValuePair {
    type Err = AttrKeyValuePairParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Self::parse_with_env(input, |name| std::env::var(name).ok())
    }
}

impl From<(String, AttrValue)> for AttrKeyEqValuePair {
    fn from((k, v): (String, AttrValue)) -> Self {
        Self(k, v)
    }
}

impl fmt::Display for AttrKeyEqValuePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.1 {
            AttrValue::Text(s) => write!(f, "{} = \"{}\"", self.0, s),
            AttrValue::TimelineId(id) => write!(f, "{} = \"{}\"", self.0, id),
            v => write!(f, "{} = {}", self.0, v),
        }
    }
}
