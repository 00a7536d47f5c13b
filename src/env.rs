// src/env.rs

//! Environment overlay applied to spawned processes.
//!
//! An [`EnvOverlay`] is a plain value: it is carried by a [`crate::Shell`] or
//! a [`crate::ProcessHandle`] and only takes effect when a process is
//! spawned. The environment of the current process is never modified.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Variables layered on top of the inherited environment.
///
/// Keys present in the overlay take precedence over inherited values of the
/// same name. Everything else is inherited unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct EnvOverlay {
    vars: BTreeMap<String, String>,
}

impl EnvOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`, replacing an earlier override of the same key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.vars.remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Layer `other` on top of `self`; keys in `other` win.
    pub fn extend_from(&mut self, other: &EnvOverlay) {
        for (k, v) in other.iter() {
            self.set(k, v);
        }
    }

    /// Merge the overlay on top of an arbitrary inherited environment.
    pub fn merged_with<I, K, V>(&self, inherited: I) -> BTreeMap<String, String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut env: BTreeMap<String, String> = inherited
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        for (k, v) in self.iter() {
            env.insert(k.to_string(), v.to_string());
        }
        env
    }

    /// The environment a process spawned with this overlay will observe.
    ///
    /// Variables whose name or value is not valid unicode are skipped.
    pub fn merged(&self) -> BTreeMap<String, String> {
        let inherited = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)));
        self.merged_with(inherited)
    }

    pub(crate) fn apply(&self, cmd: &mut tokio::process::Command) {
        cmd.envs(self.iter());
    }
}

impl<K, V> FromIterator<(K, V)> for EnvOverlay
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            vars: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Value of the inherited variable `key`, or `default` if it is unset or empty.
pub fn var_or(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(val) if !val.is_empty() => val,
        _ => default.to_string(),
    }
}
