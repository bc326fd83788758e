//! Dependency pruning.
//!
//! Reduces the project's dependency manifests to the packages that stay
//! external to the bundle and produces the descriptor shipped with it.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::Result;

use crate::core::manifest::OPTIONAL_DEPENDENCIES_KEY;
use crate::core::{BuildMode, DependencyManifest, PackageDescriptor, Project};

/// Result of pruning a project's manifests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrunedManifests {
    /// Runtime dependencies that stay external
    pub runtime: DependencyManifest,

    /// Development dependencies; `None` in production builds
    pub dev: Option<DependencyManifest>,

    /// Optional dependencies that stay external
    pub optional: DependencyManifest,
}

impl PrunedManifests {
    /// Whether every dependency set is absent or empty.
    pub fn is_empty(&self) -> bool {
        self.runtime.is_empty()
            && self.optional.is_empty()
            && self.dev.as_ref().map_or(true, DependencyManifest::is_empty)
    }
}

/// Keep only the manifest entries named in `externals`.
///
/// In production mode the development manifest is dropped entirely.
pub fn prune(
    full: &DependencyManifest,
    externals: &BTreeSet<String>,
    dev: &DependencyManifest,
    mode: BuildMode,
) -> PrunedManifests {
    let keep = |name: &str| externals.contains(name);

    PrunedManifests {
        runtime: full.retain_names(keep),
        dev: mode.keeps_dev_dependencies().then(|| dev.retain_names(keep)),
        optional: DependencyManifest::new(),
    }
}

/// Externals that no manifest declares.
pub fn undeclared_externals<'a>(
    externals: &'a BTreeSet<String>,
    manifests: &[&DependencyManifest],
) -> Vec<&'a str> {
    externals
        .iter()
        .map(String::as_str)
        .filter(|name| !manifests.iter().any(|m| m.contains(name)))
        .collect()
}

/// Build the descriptor shipped with the bundle.
///
/// Dependency sections are replaced by their pruned versions, fields listed
/// in `drop_fields` are removed, everything else passes through.
pub fn pruned_descriptor(
    descriptor: &PackageDescriptor,
    externals: &BTreeSet<String>,
    mode: BuildMode,
    drop_fields: &[String],
) -> Result<(PackageDescriptor, PrunedManifests)> {
    let full = descriptor.dependencies()?;
    let dev = descriptor.dev_dependencies()?;
    let optional = descriptor.optional_dependencies()?;

    for name in undeclared_externals(externals, &[&full, &dev, &optional]) {
        tracing::warn!("external `{}` is not declared in package.json", name);
    }

    let mut pruned = prune(&full, externals, &dev, mode);
    pruned.optional = optional.retain_names(|name| externals.contains(name));

    let mut output = descriptor.clone();
    for field in drop_fields {
        if output.remove_field(field) {
            tracing::debug!("dropped `{}` from bundled package.json", field);
        }
    }

    output.set_dependencies(&pruned.runtime);
    output.set_dev_dependencies(pruned.dev.as_ref());

    if pruned.optional.is_empty() {
        output.remove_field(OPTIONAL_DEPENDENCIES_KEY);
    } else {
        output.set_field(OPTIONAL_DEPENDENCIES_KEY, pruned.optional.to_value());
    }

    Ok((output, pruned))
}

/// Prune a project's descriptor and write it into the bundle.
pub fn write_pruned_descriptor(
    project: &Project,
    mode: BuildMode,
) -> Result<(PathBuf, PackageDescriptor, PrunedManifests)> {
    let externals = project.externals()?;
    let (descriptor, pruned) = pruned_descriptor(
        project.descriptor(),
        &externals,
        mode,
        &project.config().bundle.drop_fields,
    )?;

    let path = project.output_descriptor_path();
    descriptor.save(&path)?;

    tracing::info!(
        "Pruned package.json: {} runtime, {} dev dependencies ({} mode)",
        pruned.runtime.len(),
        pruned.dev.as_ref().map_or(0, DependencyManifest::len),
        mode
    );

    Ok((path, descriptor, pruned))
}
