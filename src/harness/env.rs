//! Environment-variable overrides for child processes.
//!
//! The harness never calls `std::env::set_var`. Each step that needs overrides takes a snapshot of
//! the ambient environment, layers its overrides on top, and hands the resulting map to the child
//! explicitly. Cases therefore cannot leak variables into each other or into the host process.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};

/// How an override interacts with a variable that is already set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverridePolicy {
    /// Only set the variable if the ambient environment lacks it.
    Default,
    /// Always set the variable.
    Force,
}

/// An ordered set of environment overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    entries: Vec<(OsString, OsString, OverridePolicy)>,
}

/// A fully resolved child environment.
pub type EnvMap = BTreeMap<OsString, OsString>;

impl EnvOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable that yields to an existing ambient value.
    pub fn with_default(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.push(key.into(), value.into(), OverridePolicy::Default);
        self
    }

    /// Add a variable that replaces any existing ambient value.
    pub fn with_var(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.push(key.into(), value.into(), OverridePolicy::Force);
        self
    }

    /// Merge `other` on top of `self`; later entries for the same key win.
    pub fn extend(mut self, other: &EnvOverrides) -> Self {
        for (key, value, policy) in &other.entries {
            self.push(key.clone(), value.clone(), *policy);
        }
        self
    }

    fn push(&mut self, key: OsString, value: OsString, policy: OverridePolicy) {
        self.entries.retain(|(k, _, _)| k != &key);
        self.entries.push((key, value, policy));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up the override registered for `key`, if any.
    pub fn get(&self, key: impl AsRef<OsStr>) -> Option<(&OsStr, OverridePolicy)> {
        let key = key.as_ref();
        self.entries
            .iter()
            .find(|(k, _, _)| k == key)
            .map(|(_, v, p)| (v.as_os_str(), *p))
    }

    /// Resolve the overrides against an explicit base environment.
    pub fn apply_to<I, K, V>(&self, base: I) -> EnvMap
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<OsString>,
        V: Into<OsString>,
    {
        let mut env: EnvMap = base.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        for (key, value, policy) in &self.entries {
            match policy {
                OverridePolicy::Force => {
                    env.insert(key.clone(), value.clone());
                }
                OverridePolicy::Default => {
                    env.entry(key.clone()).or_insert_with(|| value.clone());
                }
            }
        }
        env
    }

    /// Resolve the overrides against a fresh snapshot of the process environment.
    pub fn resolve(&self) -> EnvMap {
        self.apply_to(std::env::vars_os())
    }
}
