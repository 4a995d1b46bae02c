use serde::Serialize;
use std::collections::BTreeMap;

const MASK: &str = "********";

/// Resolved `--build-arg` values, keyed by argument name.
///
/// Later inserts overwrite earlier ones, so callers apply sources from the
/// lowest to the highest precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BuildArgs {
    values: BTreeMap<String, String>,
}

impl BuildArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Apply a layer of pairs on top of the current values.
    pub fn merge<I, K, V>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in pairs {
            self.set(key, value);
        }
    }

    /// Apply raw `KEY=VALUE` strings and return the ones that were rejected.
    pub fn apply_overrides(&mut self, raw: &[String]) -> Vec<String> {
        let mut rejected = Vec::new();
        for arg in raw {
            match parse_override(arg) {
                Some((key, value)) => self.set(key, value),
                None => rejected.push(arg.clone()),
            }
        }
        rejected
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `--build-arg KEY=VALUE` pairs for `docker build`.
    pub fn to_docker_args(&self) -> Vec<String> {
        self.iter()
            .flat_map(|(k, v)| ["--build-arg".to_string(), format!("{}={}", k, v)])
            .collect()
    }

    /// Values safe to print, secrets masked.
    pub fn masked(&self) -> Vec<(&str, String)> {
        self.iter().map(|(k, v)| (k, mask_value(k, v))).collect()
    }
}

/// Split `KEY=VALUE` on the first `=`. Missing `=` or an empty key is rejected.
pub fn parse_override(raw: &str) -> Option<(String, String)> {
    let (key, value) = raw.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), value.to_string()))
}

/// Arguments whose name mentions KEY are treated as secrets.
pub fn is_secret(key: &str) -> bool {
    key.to_ascii_uppercase().contains("KEY")
}

pub fn mask_value(key: &str, value: &str) -> String {
    if is_secret(key) && !value.is_empty() {
        MASK.to_string()
    } else {
        value.to_string()
    }
}

/// Mask the value of a `KEY=VALUE` string when the key is secret.
pub fn mask_assignment(assignment: &str) -> String {
    match assignment.split_once('=') {
        Some((key, value)) => format!("{}={}", key, mask_value(key, value)),
        None => assignment.to_string(),
    }
}

/// Printable form of input that failed to parse. When it mentions a secret
/// only the leading name survives, since the value may sit anywhere in it.
pub fn redact(raw: &str) -> String {
    let trimmed = raw.trim();
    if !is_secret(trimmed) {
        return trimmed.to_string();
    }
    let unexported = trimmed.strip_prefix("export ").unwrap_or(trimmed).trim_start();
    let name: String = unexported
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    if name.is_empty() {
        MASK.to_string()
    } else {
        format!("{} {}", name, MASK)
    }
}
