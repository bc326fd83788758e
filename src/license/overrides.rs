//! Manual license assertions.

use std::collections::{BTreeMap, BTreeSet};

use crate::core::PackageKey;

/// Mapping from `name` or `name@version` to an asserted license.
///
/// A versioned key wins over a bare name for the same package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideTable {
    entries: BTreeMap<String, String>,
}

impl OverrideTable {
    /// Create an empty table.
    pub fn new() -> Self {
        OverrideTable::default()
    }

    /// Add an override.
    pub fn insert(&mut self, key: impl Into<String>, license: impl Into<String>) {
        self.entries.insert(key.into(), license.into());
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, license: impl Into<String>) -> Self {
        self.insert(key, license);
        self
    }

    /// Find the asserted license for a package, if any.
    pub fn lookup(&self, key: &PackageKey) -> Option<&str> {
        self.entries
            .get(&key.to_string())
            .or_else(|| self.entries.get(key.name()))
            .map(String::as_str)
    }

    /// Override keys that matched none of the given packages.
    pub fn unused<'a, I>(&self, packages: I) -> Vec<&str>
    where
        I: IntoIterator<Item = &'a PackageKey>,
    {
        let mut used = BTreeSet::new();
        for key in packages {
            let versioned = key.to_string();
            if self.entries.contains_key(&versioned) {
                used.insert(versioned);
            } else if self.entries.contains_key(key.name()) {
                used.insert(key.name().to_string());
            }
        }

        self.entries
            .keys()
            .filter(|k| !used.contains(*k))
            .map(String::as_str)
            .collect()
    }

    /// Number of overrides.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<BTreeMap<String, String>> for OverrideTable {
    fn from(entries: BTreeMap<String, String>) -> Self {
        OverrideTable { entries }
    }
}
