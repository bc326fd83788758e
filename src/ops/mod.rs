//! High-level operations.
//!
//! This module contains the implementation of Shipyard commands.

pub mod bundle;
pub mod licenses;
pub mod prune;

pub use bundle::{build, copy_resources, BundleOptions, BundleResult};
pub use licenses::LicenseAggregator;
pub use prune::{prune, pruned_descriptor, write_pruned_descriptor, PrunedManifests};
