//! License summary - the compliance artifact.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::PackageKey;
use crate::util::fs;

/// License information for one package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseRecord {
    /// Where the package's code lives
    pub repository: String,

    /// Resolved license identifier or expression
    pub license: String,

    /// Where the license text can be found
    pub source: String,

    /// Literal license text, when available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_text: Option<String>,
}

/// Mapping from `name@version` to license record, ordered by key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LicenseSummary {
    entries: BTreeMap<PackageKey, LicenseRecord>,
}

impl LicenseSummary {
    /// Create an empty summary.
    pub fn new() -> Self {
        LicenseSummary::default()
    }

    /// Add or replace a record, returning the previous one.
    pub fn insert(&mut self, key: PackageKey, record: LicenseRecord) -> Option<LicenseRecord> {
        self.entries.insert(key, record)
    }

    /// Get the record for a package.
    pub fn get(&self, key: &PackageKey) -> Option<&LicenseRecord> {
        self.entries.get(key)
    }

    /// Find a record by its `name@version` string.
    pub fn get_str(&self, key: &str) -> Option<&LicenseRecord> {
        PackageKey::parse(key).ok().and_then(|k| self.entries.get(&k))
    }

    /// Iterate over records in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&PackageKey, &LicenseRecord)> {
        self.entries.iter()
    }

    /// Package keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &PackageKey> {
        self.entries.keys()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the summary is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize as pretty-printed JSON with a trailing newline.
    pub fn to_json_pretty(&self) -> Result<String> {
        let mut out =
            serde_json::to_string_pretty(self).context("failed to serialize license summary")?;
        out.push('\n');
        Ok(out)
    }

    /// Write the summary to disk.
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write_atomic(path, &self.to_json_pretty()?)
    }
}
