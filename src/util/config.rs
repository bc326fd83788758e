//! Configuration file support for Shipyard.
//!
//! Shipyard reads two configuration files:
//! - Global: `<config dir>/shipyard/config.toml` - organisation-wide license policy
//! - Project: `Shipyard.toml` at the project root - everything else
//!
//! Project settings take precedence over global ones.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use miette::{Diagnostic as MietteDiagnostic, NamedSource, SourceSpan};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the project configuration file.
pub const CONFIG_NAME: &str = "Shipyard.toml";

/// Default directory the bundle is assembled into.
pub const DEFAULT_OUTPUT_DIR: &str = "dist/app";

/// Default file name of the license summary inside the output directory.
pub const DEFAULT_SUMMARY_NAME: &str = "licenses.json";

/// Default source URL template for the host project's license.
pub const DEFAULT_SOURCE_TEMPLATE: &str = "{repository}/blob/release-{version}/LICENSE";

/// A configuration file that is not valid TOML or does not match the schema.
#[derive(Debug, Error, MietteDiagnostic)]
#[error("failed to parse config file {}: {}", .path.display(), .message)]
#[diagnostic(
    code(shipyard::config::parse),
    help("see the [bundle], [licenses] and [host] sections of Shipyard.toml")
)]
pub struct ConfigParseError {
    pub path: PathBuf,
    pub message: String,
    #[source_code]
    pub src: NamedSource<String>,
    #[label("here")]
    pub span: Option<SourceSpan>,
}

impl ConfigParseError {
    fn new(path: &Path, contents: &str, err: toml::de::Error) -> Self {
        ConfigParseError {
            path: path.to_path_buf(),
            message: err.message().trim().to_string(),
            src: NamedSource::new(path.display().to_string(), contents.to_string()),
            span: err.span().map(SourceSpan::from),
        }
    }
}

/// Shipyard configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ShipyardConfig {
    /// Bundle assembly settings
    pub bundle: BundleConfig,

    /// License report settings
    pub licenses: LicenseConfig,

    /// The host project's own license entry
    pub host: HostConfig,
}

/// Bundle assembly settings from `[bundle]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BundleConfig {
    /// Output directory, relative to the project root
    pub output_dir: PathBuf,

    /// Packages kept external to the bundle
    pub externals: Vec<String>,

    /// JSON file holding an array of external package names
    pub externals_file: Option<PathBuf>,

    /// Descriptor fields removed from the bundled package.json
    pub drop_fields: Vec<String>,

    /// Command run inside the output directory when dependencies remain
    pub install_command: Option<Vec<String>>,

    /// Static resources copied into the output directory
    pub copy: Vec<CopyRule>,
}

impl Default for BundleConfig {
    fn default() -> Self {
        BundleConfig {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            externals: Vec::new(),
            externals_file: None,
            drop_fields: Vec::new(),
            install_command: None,
            copy: Vec::new(),
        }
    }
}

/// A static resource copy rule from `[[bundle.copy]]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CopyRule {
    /// File, directory or glob pattern relative to the project root
    pub from: String,

    /// Destination relative to the output directory (defaults to `from`)
    #[serde(default)]
    pub to: Option<String>,
}

impl CopyRule {
    /// Create a copy rule.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        CopyRule {
            from: from.into(),
            to: Some(to.into()),
        }
    }

    /// Destination relative to the output directory.
    pub fn destination(&self) -> &str {
        self.to.as_deref().unwrap_or(&self.from)
    }
}

/// License report settings from `[licenses]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LicenseConfig {
    /// Summary output path (defaults to `<output-dir>/licenses.json`)
    pub output: Option<PathBuf>,

    /// Also scan development dependencies
    pub include_dev: bool,

    /// Extra license identifiers treated as permissive
    pub permissive: Vec<String>,

    /// Manual license assertions keyed by `name` or `name@version`
    pub overrides: BTreeMap<String, String>,
}

/// Host project license entry from `[host]`.
///
/// Unset fields fall back to the project's package.json.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HostConfig {
    /// Host package name
    pub name: Option<String>,

    /// Host release version
    pub version: Option<String>,

    /// License identifier of the host project
    pub license: Option<String>,

    /// Repository URL of the host project
    pub repository: Option<String>,

    /// License source URL template; `{repository}`, `{name}` and `{version}` are substituted
    pub source_template: String,

    /// Root license file, relative to the project root
    pub license_file: PathBuf,
}

impl Default for HostConfig {
    fn default() -> Self {
        HostConfig {
            name: None,
            version: None,
            license: None,
            repository: None,
            source_template: DEFAULT_SOURCE_TEMPLATE.to_string(),
            license_file: PathBuf::from("LICENSE"),
        }
    }
}

impl ShipyardConfig {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .map_err(|e| ConfigParseError::new(path, &contents, e).into())
    }

    /// Parse configuration content.
    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Load configuration with fallback to defaults if the file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Fill license policy gaps from a global config.
    ///
    /// Global permissive identifiers are added; global overrides apply only
    /// to keys the project does not override itself.
    pub fn merge_global(&mut self, global: ShipyardConfig) {
        for id in global.licenses.permissive {
            if !self.licenses.permissive.contains(&id) {
                self.licenses.permissive.push(id);
            }
        }
        for (key, license) in global.licenses.overrides {
            self.licenses.overrides.entry(key).or_insert(license);
        }
    }
}

impl BundleConfig {
    /// Collect the externals set from the inline list and the externals file.
    pub fn load_externals(&self, project_root: &Path) -> Result<BTreeSet<String>> {
        let mut externals: BTreeSet<String> = self.externals.iter().cloned().collect();

        if let Some(ref file) = self.externals_file {
            let path = project_root.join(file);
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read externals file: {}", path.display()))?;
            let names: Vec<String> = serde_json::from_str(&contents).with_context(|| {
                format!(
                    "externals file {} must be a JSON array of package names",
                    path.display()
                )
            })?;
            externals.extend(names);
        }

        Ok(externals)
    }
}

/// Get the global config path (`<config dir>/shipyard/config.toml`).
pub fn global_config_path() -> Option<PathBuf> {
    ProjectDirs::from("dev", "shipyard", "shipyard").map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Load merged configuration from the project file and an optional global file.
///
/// A broken global config is reported and ignored; a broken project config
/// is an error.
pub fn load_config(project_path: &Path, global_path: Option<&Path>) -> Result<ShipyardConfig> {
    let mut config = ShipyardConfig::load(project_path)?;

    if let Some(global_path) = global_path {
        if global_path.exists() {
            tracing::debug!("Merging global config from {}", global_path.display());
            config.merge_global(ShipyardConfig::load_or_default(global_path));
        }
    }

    Ok(config)
}
