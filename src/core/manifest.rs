//! `package.json` descriptor and dependency manifests.
//!
//! The descriptor is kept as a raw JSON object so that fields Shipyard does
//! not know about pass through to the bundled output unchanged.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::util::fs;

/// Descriptor key holding runtime dependencies.
pub const DEPENDENCIES_KEY: &str = "dependencies";

/// Descriptor key holding development-only dependencies.
pub const DEV_DEPENDENCIES_KEY: &str = "devDependencies";

/// Descriptor key holding optional runtime dependencies.
pub const OPTIONAL_DEPENDENCIES_KEY: &str = "optionalDependencies";

/// Ordered mapping from package name to version specifier.
///
/// Iteration and serialization are sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencyManifest {
    entries: BTreeMap<String, String>,
}

impl DependencyManifest {
    /// Create an empty manifest.
    pub fn new() -> Self {
        DependencyManifest::default()
    }

    /// Add or replace an entry.
    pub fn insert(&mut self, name: impl Into<String>, version: impl Into<String>) {
        self.entries.insert(name.into(), version.into());
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.insert(name, version);
        self
    }

    /// Get the version specifier for a package.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Check whether a package is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Iterate over `(name, version)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Declared package names.
    pub fn names(&self) -> BTreeSet<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no packages are declared.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keep only the entries whose name satisfies the predicate.
    pub fn retain_names<F>(&self, mut keep: F) -> DependencyManifest
    where
        F: FnMut(&str) -> bool,
    {
        DependencyManifest {
            entries: self
                .entries
                .iter()
                .filter(|(name, _)| keep(name))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// Convert to a JSON object value.
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        )
    }

    /// Read a manifest from a JSON object value.
    ///
    /// Entries whose version is not a string are skipped with a warning.
    fn from_value(field: &str, value: &Value) -> Result<Self> {
        let obj = value
            .as_object()
            .with_context(|| format!("`{}` must be an object", field))?;

        let mut manifest = DependencyManifest::new();
        for (name, spec) in obj {
            match spec.as_str() {
                Some(spec) => manifest.insert(name.clone(), spec),
                None => tracing::warn!(
                    "ignoring `{}` entry `{}`: version specifier is not a string",
                    field,
                    name
                ),
            }
        }
        Ok(manifest)
    }
}

impl FromIterator<(String, String)> for DependencyManifest {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        DependencyManifest {
            entries: iter.into_iter().collect(),
        }
    }
}

/// A parsed `package.json`.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageDescriptor {
    fields: Map<String, Value>,
}

impl PackageDescriptor {
    /// Load a descriptor from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
            .with_context(|| format!("failed to parse package descriptor: {}", path.display()))
    }

    /// Parse descriptor content.
    pub fn parse(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content).context("invalid JSON")?;
        match value {
            Value::Object(fields) => Ok(PackageDescriptor { fields }),
            _ => anyhow::bail!("package descriptor must be a JSON object"),
        }
    }

    /// Create a descriptor from raw fields.
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        PackageDescriptor { fields }
    }

    /// Package name, if declared.
    pub fn name(&self) -> Option<&str> {
        self.fields.get("name").and_then(Value::as_str)
    }

    /// Package version, if declared.
    pub fn version(&self) -> Option<&str> {
        self.fields.get("version").and_then(Value::as_str)
    }

    /// Get a raw field.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Runtime dependencies.
    pub fn dependencies(&self) -> Result<DependencyManifest> {
        self.manifest(DEPENDENCIES_KEY)
    }

    /// Development-only dependencies.
    pub fn dev_dependencies(&self) -> Result<DependencyManifest> {
        self.manifest(DEV_DEPENDENCIES_KEY)
    }

    /// Optional runtime dependencies.
    pub fn optional_dependencies(&self) -> Result<DependencyManifest> {
        self.manifest(OPTIONAL_DEPENDENCIES_KEY)
    }

    fn manifest(&self, key: &str) -> Result<DependencyManifest> {
        match self.fields.get(key) {
            Some(value) => DependencyManifest::from_value(key, value),
            None => Ok(DependencyManifest::new()),
        }
    }

    /// Replace the runtime dependencies.
    pub fn set_dependencies(&mut self, deps: &DependencyManifest) {
        self.fields
            .insert(DEPENDENCIES_KEY.to_string(), deps.to_value());
    }

    /// Replace or remove the development dependencies.
    ///
    /// `None` removes the key entirely rather than writing an empty object.
    pub fn set_dev_dependencies(&mut self, deps: Option<&DependencyManifest>) {
        match deps {
            Some(deps) => {
                self.fields
                    .insert(DEV_DEPENDENCIES_KEY.to_string(), deps.to_value());
            }
            None => {
                self.fields.remove(DEV_DEPENDENCIES_KEY);
            }
        }
    }

    /// Set a raw field.
    pub fn set_field(&mut self, key: &str, value: Value) {
        self.fields.insert(key.to_string(), value);
    }

    /// Remove a field, returning whether it was present.
    pub fn remove_field(&mut self, key: &str) -> bool {
        self.fields.remove(key).is_some()
    }

    /// Whether an install step is needed for this descriptor.
    ///
    /// False when every dependency set is absent or empty.
    pub fn needs_install(&self) -> bool {
        let non_empty = |key: &str| {
            self.fields
                .get(key)
                .and_then(Value::as_object)
                .is_some_and(|obj| !obj.is_empty())
        };
        non_empty(DEPENDENCIES_KEY)
            || non_empty(DEV_DEPENDENCIES_KEY)
            || non_empty(OPTIONAL_DEPENDENCIES_KEY)
    }

    /// Serialize as pretty-printed JSON with a trailing newline.
    pub fn to_json_pretty(&self) -> Result<String> {
        let mut out = serde_json::to_string_pretty(&self.fields)
            .context("failed to serialize package descriptor")?;
        out.push('\n');
        Ok(out)
    }

    /// Write the descriptor to disk.
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write_atomic(path, &self.to_json_pretty()?)
    }
}
