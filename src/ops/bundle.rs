//! Implementation of `shipyard build`.

use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::core::{BuildMode, Project};
use crate::license::LicenseError;
use crate::ops::licenses::LicenseAggregator;
use crate::ops::prune::{write_pruned_descriptor, PrunedManifests};
use crate::util::config::CopyRule;
use crate::util::fs::{
    copy_dir_all, copy_file, glob_files, is_glob_pattern, relative_path, remove_dir_all_if_exists,
    remove_file_if_exists,
};
use crate::util::process::ProcessBuilder;

/// Options for the build command.
#[derive(Debug, Clone, Default)]
pub struct BundleOptions {
    /// Build mode; decides which dev dependencies survive and whether
    /// license problems are fatal
    pub mode: BuildMode,

    /// Run the configured install command in the output directory
    pub install: bool,
}

impl BundleOptions {
    pub fn new(mode: BuildMode) -> Self {
        BundleOptions {
            mode,
            install: true,
        }
    }
}

/// What a build produced.
#[derive(Debug)]
pub struct BundleResult {
    /// The written `<output-dir>/package.json`
    pub descriptor_path: PathBuf,

    /// Dependency sections of the written descriptor
    pub pruned: PrunedManifests,

    /// Files copied into the output directory
    pub copied: Vec<PathBuf>,

    /// Whether the install command ran
    pub installed: bool,

    /// Where the license summary was written, if it was
    pub summary_path: Option<PathBuf>,

    /// License problem tolerated in this mode; the summary was not written
    pub license_warning: Option<LicenseError>,
}

/// Assemble the bundle directory for a project.
///
/// Output from earlier builds is removed first. Steps then run in order:
/// prune and write the descriptor, gate on licenses,
/// copy static resources, install remaining dependencies, write the license
/// summary. A fatal license error stops the build before anything else is
/// copied or installed.
pub fn build(project: &Project, opts: &BundleOptions) -> Result<BundleResult> {
    tracing::info!(
        "Bundling {} into {} ({} mode)",
        project.descriptor().name().unwrap_or("project"),
        project.output_dir().display(),
        opts.mode
    );

    clean_output(project)?;

    let (descriptor_path, descriptor, pruned) = write_pruned_descriptor(project, opts.mode)?;

    let host = project.host()?;
    let (summary, license_warning) = match LicenseAggregator::for_project(project).aggregate(&host) {
        Ok(summary) => (Some(summary), None),
        Err(err) if err.is_fatal(opts.mode) => return Err(err.into()),
        Err(err) => {
            tracing::warn!("skipping license summary: {}", err);
            (None, Some(err))
        }
    };

    let copied = copy_resources(project.root(), &project.output_dir(), &project.config().bundle.copy)?;

    let installed = if !opts.install {
        false
    } else if !descriptor.needs_install() {
        tracing::info!("No dependencies left after pruning, skipping install");
        false
    } else {
        match &project.config().bundle.install_command {
            Some(argv) => {
                run_install(argv, &project.output_dir(), opts.mode)?;
                true
            }
            None => {
                tracing::debug!("no install command configured");
                false
            }
        }
    };

    let summary_path = match summary {
        Some(summary) => {
            let path = project.summary_path();
            summary.save(&path)?;
            tracing::info!("Wrote license summary to {}", path.display());
            Some(path)
        }
        None => None,
    };

    Ok(BundleResult {
        descriptor_path,
        pruned,
        copied,
        installed,
        summary_path,
        license_warning,
    })
}

/// Remove the output directory and the license summary of a previous build.
pub fn clean_output(project: &Project) -> Result<()> {
    let output_dir = project.output_dir();
    let contains_root = match (output_dir.canonicalize(), project.root().canonicalize()) {
        (Ok(output), Ok(root)) => root.starts_with(output),
        _ => false,
    };
    if contains_root {
        bail!(
            "output directory {} contains the project; set `output-dir` under [bundle]",
            output_dir.display()
        );
    }

    tracing::debug!("clearing {}", output_dir.display());
    remove_dir_all_if_exists(&output_dir)?;
    remove_file_if_exists(&project.summary_path())
}

/// Copy static resources into the output directory.
///
/// `from` may name a file, a directory or a glob pattern. Glob matches keep
/// their path relative to the pattern's literal prefix.
pub fn copy_resources(root: &Path, output_dir: &Path, rules: &[CopyRule]) -> Result<Vec<PathBuf>> {
    let mut copied = Vec::new();

    for rule in rules {
        let dest = output_dir.join(rule.destination());

        if is_glob_pattern(&rule.from) {
            let base = root.join(literal_prefix(&rule.from));
            let matches = glob_files(root, std::slice::from_ref(&rule.from))?;
            if matches.is_empty() {
                tracing::warn!("copy pattern `{}` matched no files", rule.from);
            }
            for path in matches {
                let relative = path.strip_prefix(&base).unwrap_or(&path);
                let target = dest.join(relative);
                copy_file(&path, &target)?;
                copied.push(target);
            }
            continue;
        }

        let src = root.join(&rule.from);
        if src.is_dir() {
            copy_dir_all(&src, &dest)?;
        } else if src.is_file() {
            copy_file(&src, &dest)?;
        } else {
            bail!("copy source does not exist: {}", src.display());
        }
        tracing::debug!(
            "copied {} -> {}",
            relative_path(root, &src).display(),
            relative_path(output_dir, &dest).display()
        );
        copied.push(dest);
    }

    Ok(copied)
}

/// Leading path components of a glob pattern that contain no metacharacters.
fn literal_prefix(pattern: &str) -> PathBuf {
    Path::new(pattern)
        .components()
        .take_while(|c| match c {
            Component::Normal(part) => !is_glob_pattern(&part.to_string_lossy()),
            _ => true,
        })
        .collect()
}

fn run_install(argv: &[String], output_dir: &Path, mode: BuildMode) -> Result<()> {
    let cmd = ProcessBuilder::from_argv(argv)?
        .cwd(output_dir)
        .env("NODE_ENV", mode.as_str());
    tracing::info!("Installing dependencies: {}", cmd.display_command());
    cmd.status_and_check()
        .with_context(|| format!("install failed in {}", output_dir.display()))
}
