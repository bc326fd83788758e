//! Project - central configuration hub.
//!
//! A Project ties together the project root, its `Shipyard.toml` and its
//! `package.json`, and derives every path and policy the operations need.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::core::PackageDescriptor;
use crate::license::{HostProject, LicensePolicy, OverrideTable};
use crate::util::config::{load_config, ShipyardConfig, DEFAULT_SUMMARY_NAME};
use crate::util::GlobalContext;

/// Name of the package descriptor file.
pub const DESCRIPTOR_NAME: &str = "package.json";

/// A project being bundled.
#[derive(Debug, Clone)]
pub struct Project {
    /// Project root directory
    root: PathBuf,

    /// Merged configuration
    config: ShipyardConfig,

    /// The root package.json
    descriptor: PackageDescriptor,
}

impl Project {
    /// Load a project from its `Shipyard.toml` path.
    pub fn load(config_path: &Path, ctx: &GlobalContext) -> Result<Self> {
        let config = load_config(config_path, ctx.global_config_path())?;
        let root = config_path
            .parent()
            .unwrap_or(Path::new("."))
            .to_path_buf();
        let descriptor = PackageDescriptor::load(&root.join(DESCRIPTOR_NAME))?;

        Ok(Project::new(root, config, descriptor))
    }

    /// Create a project from already loaded parts.
    pub fn new(root: PathBuf, config: ShipyardConfig, descriptor: PackageDescriptor) -> Self {
        Project {
            root,
            config,
            descriptor,
        }
    }

    /// Get the project root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the configuration.
    pub fn config(&self) -> &ShipyardConfig {
        &self.config
    }

    /// Get the root package descriptor.
    pub fn descriptor(&self) -> &PackageDescriptor {
        &self.descriptor
    }

    /// Path of the root package descriptor.
    pub fn descriptor_path(&self) -> PathBuf {
        self.root.join(DESCRIPTOR_NAME)
    }

    /// Directory the bundle is assembled into.
    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.config.bundle.output_dir)
    }

    /// Path of the pruned descriptor inside the bundle.
    pub fn output_descriptor_path(&self) -> PathBuf {
        self.output_dir().join(DESCRIPTOR_NAME)
    }

    /// Path the license summary is written to.
    pub fn summary_path(&self) -> PathBuf {
        match self.config.licenses.output {
            Some(ref output) => self.root.join(output),
            None => self.output_dir().join(DEFAULT_SUMMARY_NAME),
        }
    }

    /// Packages kept external to the bundle.
    pub fn externals(&self) -> Result<BTreeSet<String>> {
        self.config.bundle.load_externals(&self.root)
    }

    /// Manual license overrides.
    pub fn overrides(&self) -> OverrideTable {
        OverrideTable::from(self.config.licenses.overrides.clone())
    }

    /// License classification policy.
    pub fn license_policy(&self) -> LicensePolicy {
        LicensePolicy::new(&self.config.licenses.permissive)
    }

    /// The host project's summary entry.
    pub fn host(&self) -> Result<HostProject> {
        HostProject::resolve(&self.config.host, &self.descriptor, &self.root)
    }
}
