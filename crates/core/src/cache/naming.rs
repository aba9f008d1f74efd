//! Store naming and version derivation.
//!
//! A store name is `{prefix}-{role}-{version}`. Only names built from the
//! current version are "current"; everything else is garbage once the
//! worker activates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Logical partition of cached entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum StoreRole {
    /// Pre-cached assets, served cache-first.
    Static,
    /// Pages and generic responses, refreshed in the background.
    Dynamic,
    Images,
    /// Network-first responses.
    Api,
}

impl StoreRole {
    pub const ALL: [StoreRole; 4] = [StoreRole::Static, StoreRole::Dynamic, StoreRole::Images, StoreRole::Api];

    pub fn as_str(self) -> &'static str {
        match self {
            StoreRole::Static => "static",
            StoreRole::Dynamic => "dynamic",
            StoreRole::Images => "images",
            StoreRole::Api => "api",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.as_str() == s)
    }
}

impl fmt::Display for StoreRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Store names for one prefix and version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreNames {
    prefix: String,
    version: String,
}

impl StoreNames {
    pub fn new(prefix: &str, version: &str) -> Self {
        Self { prefix: prefix.to_string(), version: version.to_string() }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Current store name for `role`.
    pub fn name(&self, role: StoreRole) -> String {
        format!("{}-{}-{}", self.prefix, role, self.version)
    }

    /// Version string reported to pages that ask for it.
    pub fn worker_version(&self) -> String {
        format!("{}-portfolio-{}", self.prefix, self.version)
    }

    /// Every store name that survives activation.
    pub fn keep_set(&self) -> Vec<String> {
        StoreRole::ALL.into_iter().map(|role| self.name(role)).collect()
    }

    pub fn is_current(&self, name: &str) -> bool {
        self.role_of(name).is_some()
    }

    /// Role of a current store name, `None` for foreign or stale names.
    pub fn role_of(&self, name: &str) -> Option<StoreRole> {
        let (role, version) = self.split(name)?;
        (version == self.version).then_some(role)
    }

    /// Version suffix of any store built with this prefix.
    pub fn version_of<'a>(&self, name: &'a str) -> Option<&'a str> {
        self.split(name).map(|(_, version)| version)
    }

    /// Stores to consult for a lookup: `primary` first, then the rest in
    /// declaration order.
    pub fn lookup_order(&self, primary: StoreRole) -> Vec<String> {
        std::iter::once(primary)
            .chain(StoreRole::ALL.into_iter().filter(|role| *role != primary))
            .map(|role| self.name(role))
            .collect()
    }

    fn split<'a>(&self, name: &'a str) -> Option<(StoreRole, &'a str)> {
        let rest = name.strip_prefix(self.prefix.as_str())?.strip_prefix('-')?;
        let (role, version) = rest.split_once('-')?;
        let role = StoreRole::parse(role)?;
        (!version.is_empty()).then_some((role, version))
    }
}
