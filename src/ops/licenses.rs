//! License aggregation operations.
//!
//! Aggregation runs in two phases. The check phase scans the dependency
//! tree and reports only packages whose license is unknown or
//! non-permissive and not overridden; any such package stops aggregation.
//! The full phase rescans and records every package, then the host
//! project's own entry is added.

use std::path::{Path, PathBuf};

use crate::core::{PackageDescriptor, Project};
use crate::license::{
    DependencyScanner, HostProject, LicenseError, LicensePolicy, LicenseRecord, LicenseSummary,
    OverrideTable, ScannedPackage, UnapprovedPackage,
};

/// Scans a project's dependencies and builds its license summary.
#[derive(Debug, Clone)]
pub struct LicenseAggregator {
    scanner: DependencyScanner,
    descriptor: PackageDescriptor,
    policy: LicensePolicy,
    overrides: OverrideTable,
}

impl LicenseAggregator {
    /// Create an aggregator with the default policy and no overrides.
    pub fn new(root: impl Into<PathBuf>, descriptor: PackageDescriptor) -> Self {
        LicenseAggregator {
            scanner: DependencyScanner::new(root),
            descriptor,
            policy: LicensePolicy::default(),
            overrides: OverrideTable::new(),
        }
    }

    /// Create an aggregator configured from a project's `[licenses]` section.
    pub fn for_project(project: &Project) -> Self {
        LicenseAggregator::new(project.root(), project.descriptor().clone())
            .with_policy(project.license_policy())
            .with_overrides(project.overrides())
            .include_dev(project.config().licenses.include_dev)
    }

    /// Use a specific classification policy.
    pub fn with_policy(mut self, policy: LicensePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Use a specific override table.
    pub fn with_overrides(mut self, overrides: OverrideTable) -> Self {
        self.overrides = overrides;
        self
    }

    /// Also scan development dependencies.
    pub fn include_dev(mut self, include_dev: bool) -> Self {
        self.scanner = self.scanner.include_dev(include_dev);
        self
    }

    /// Project root being scanned.
    pub fn root(&self) -> &Path {
        self.scanner.root()
    }

    fn is_approved(&self, package: &ScannedPackage) -> bool {
        if let Some(license) = self.overrides.lookup(&package.key) {
            tracing::debug!("{}: overridden as `{}`", package.key, license);
            return true;
        }
        self.policy.is_permissive(&package.license)
    }

    /// Packages whose license is unknown or non-permissive and not overridden.
    pub fn unapproved(&self) -> Result<Vec<UnapprovedPackage>, LicenseError> {
        let packages = self.scanner.scan(&self.descriptor)?;

        Ok(packages
            .iter()
            .filter(|package| !self.is_approved(package))
            .map(|package| UnapprovedPackage {
                key: package.key.clone(),
                license: package.license.clone(),
                repository: package.repository_url(),
            })
            .collect())
    }

    /// Check phase: fail if any dependency needs an override.
    pub fn check(&self) -> Result<(), LicenseError> {
        let entries = self.unapproved()?;
        if entries.is_empty() {
            Ok(())
        } else {
            Err(LicenseError::UnapprovedLicenses { entries })
        }
    }

    /// Full phase: record every dependency's license.
    ///
    /// Overrides replace the detected license in the record.
    pub fn full_report(&self) -> Result<LicenseSummary, LicenseError> {
        let packages = self.scanner.scan(&self.descriptor)?;

        for key in self.overrides.unused(packages.iter().map(|p| &p.key)) {
            tracing::warn!("license override `{}` matches no installed dependency", key);
        }

        let mut summary = LicenseSummary::new();
        for package in packages {
            let license = self
                .overrides
                .lookup(&package.key)
                .map(str::to_string)
                .unwrap_or_else(|| package.license.clone());

            let record = LicenseRecord {
                repository: package.repository_url(),
                license,
                source: package.source_url(),
                source_text: package.license_text,
            };
            summary.insert(package.key, record);
        }

        Ok(summary)
    }

    /// Run the check phase, then the full phase, then add the host entry.
    pub fn aggregate(&self, host: &HostProject) -> Result<LicenseSummary, LicenseError> {
        self.check()?;

        let mut summary = self.full_report()?;
        let record = host.to_record()?;
        if summary.insert(host.key.clone(), record).is_some() {
            tracing::debug!("host entry {} replaced a dependency record", host.key);
        }

        tracing::info!("License summary covers {} packages", summary.len());
        Ok(summary)
    }
}
