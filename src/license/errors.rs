//! License aggregation error types and diagnostics.

use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use serde::Serialize;
use thiserror::Error;

use crate::core::{BuildMode, PackageKey};
use crate::util::diagnostic::{suggestions, Diagnostic, Severity};

/// A dependency whose license needs a manual override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnapprovedPackage {
    /// Package identity
    pub key: PackageKey,

    /// License string as detected from the package
    pub license: String,

    /// Where to look to decide on an override
    pub repository: String,
}

/// Error during license aggregation.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum LicenseError {
    #[error("found {} dependencies with unknown or non-permissive licenses", .entries.len())]
    #[diagnostic(
        code(shipyard::licenses::unapproved),
        help("add an entry under [licenses.overrides] in Shipyard.toml")
    )]
    UnapprovedLicenses { entries: Vec<UnapprovedPackage> },

    #[error("failed to read license metadata for `{package}`: {message}")]
    #[diagnostic(code(shipyard::licenses::scan_failure))]
    ScanFailure {
        package: String,
        path: PathBuf,
        message: String,
    },

    #[error("failed to read license file {}", .path.display())]
    #[diagnostic(code(shipyard::licenses::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LicenseError {
    /// Create a scan failure for a package directory.
    pub fn scan_failure(
        package: impl Into<String>,
        path: impl Into<PathBuf>,
        message: impl Into<String>,
    ) -> Self {
        LicenseError::ScanFailure {
            package: package.into(),
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether the error aborts a build in the given mode.
    ///
    /// Unapproved licenses only block production builds; incomplete
    /// metadata always does.
    pub fn is_fatal(&self, mode: BuildMode) -> bool {
        match self {
            LicenseError::UnapprovedLicenses { .. } => mode.is_production(),
            LicenseError::ScanFailure { .. } | LicenseError::Io { .. } => true,
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            LicenseError::UnapprovedLicenses { entries } => {
                let mut diag = Diagnostic::error(self.to_string());

                for entry in entries {
                    diag = diag.with_context(format!(
                        "{}: `{}` ({})",
                        entry.key, entry.license, entry.repository
                    ));
                }

                diag.with_suggestion(suggestions::ADD_OVERRIDE)
                    .with_suggestion("Replace the dependency with a permissively licensed one")
            }

            LicenseError::ScanFailure {
                package,
                path,
                message,
            } => Diagnostic::error(format!(
                "could not read license metadata for `{}`",
                package
            ))
            .with_location(path.clone())
            .with_context(message.clone())
            .with_suggestion(suggestions::INSTALL_DEPENDENCIES),

            LicenseError::Io { path, source } => {
                Diagnostic::error(format!("could not read license file: {}", source))
                    .with_location(path.clone())
                    .with_suggestion(suggestions::LICENSE_FILE)
            }
        }
    }

    /// Diagnostic with severity matching the build mode.
    pub fn to_diagnostic_for(&self, mode: BuildMode) -> Diagnostic {
        let diag = self.to_diagnostic();
        if self.is_fatal(mode) {
            diag
        } else {
            diag.severity(Severity::Warning)
        }
    }
}
