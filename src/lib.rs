//! Shipyard - bundle assembly for Node-based desktop applications
//!
//! This crate provides the core library functionality for Shipyard:
//! pruning the package descriptor down to the dependencies that stay
//! external to the bundle, and aggregating the license summary that ships
//! with it.

pub mod core;
pub mod license;
pub mod ops;
pub mod util;

/// Test utilities for Shipyard unit tests.
///
/// This module is only available when compiling with `--cfg test`. It lays
/// out throwaway Node projects with installed `node_modules` trees.
#[cfg(test)]
pub mod test_support;

pub use core::{BuildMode, DependencyManifest, PackageDescriptor, PackageKey, Project};
pub use license::{LicenseError, LicenseSummary, OverrideTable};
pub use util::context::GlobalContext;
