//! Package identification - `name@version`.
//!
//! A PackageKey names one installed package instance. It is the key of the
//! license summary and the form overrides are written in.

use std::fmt;

use semver::Version;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error parsing a `name@version` key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PackageKeyError {
    #[error("package key `{0}` is missing a `@version` suffix")]
    MissingVersion(String),

    #[error("package key `{0}` has an empty name")]
    EmptyName(String),

    #[error("invalid version in package key `{key}`: {message}")]
    InvalidVersion { key: String, message: String },
}

/// A unique identifier for an installed package.
///
/// Scoped npm names (`@scope/name`) are supported: the version is split
/// off at the last `@`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageKey {
    name: String,
    version: Version,
}

impl PackageKey {
    /// Create a new package key.
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        PackageKey {
            name: name.into(),
            version,
        }
    }

    /// Build a key from a name and an unparsed version string.
    pub fn from_parts(name: &str, version: &str) -> Result<Self, PackageKeyError> {
        if name.is_empty() {
            return Err(PackageKeyError::EmptyName(format!("{}@{}", name, version)));
        }
        let version = Version::parse(version.trim()).map_err(|e| {
            PackageKeyError::InvalidVersion {
                key: format!("{}@{}", name, version),
                message: e.to_string(),
            }
        })?;
        Ok(PackageKey::new(name, version))
    }

    /// Parse a `name@version` key.
    pub fn parse(key: &str) -> Result<Self, PackageKeyError> {
        let (name, version) =
            split_key(key).ok_or_else(|| PackageKeyError::MissingVersion(key.to_string()))?;
        Self::from_parts(name, version)
    }

    /// Get the package name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the package version.
    pub fn version(&self) -> &Version {
        &self.version
    }
}

/// Split `name@version` at the version separator.
///
/// Returns `None` for bare names, including scoped ones like `@scope/name`.
pub fn split_key(key: &str) -> Option<(&str, &str)> {
    let idx = key.rfind('@')?;
    if idx == 0 {
        return None;
    }
    Some((&key[..idx], &key[idx + 1..]))
}

impl PartialOrd for PackageKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PackageKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.version.cmp(&other.version))
    }
}

impl fmt::Display for PackageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

impl std::str::FromStr for PackageKey {
    type Err = PackageKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PackageKey::parse(s)
    }
}

impl Serialize for PackageKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PackageKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PackageKey::parse(&s).map_err(serde::de::Error::custom)
    }
}
