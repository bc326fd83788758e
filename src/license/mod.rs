//! License aggregation.
//!
//! This module scans a project's installed dependency tree, classifies each
//! package's license, applies manual overrides and builds the license
//! summary shipped with the bundle.

pub mod classify;
pub mod errors;
pub mod host;
pub mod overrides;
pub mod scan;
pub mod summary;

pub use classify::{LicensePolicy, UNKNOWN_LICENSE};
pub use errors::{LicenseError, UnapprovedPackage};
pub use host::HostProject;
pub use overrides::OverrideTable;
pub use scan::{DependencyScanner, ScannedPackage};
pub use summary::{LicenseRecord, LicenseSummary};
