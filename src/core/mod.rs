//! Core data structures for Shipyard.
//!
//! This module contains the foundational types used throughout Shipyard:
//! - Package keys (`name@version`)
//! - Package descriptors and dependency manifests
//! - Build modes
//! - Project discovery

pub mod manifest;
pub mod mode;
pub mod package_id;
pub mod workspace;

pub use manifest::{DependencyManifest, PackageDescriptor};
pub use mode::BuildMode;
pub use package_id::{PackageKey, PackageKeyError};
pub use workspace::{Project, DESCRIPTOR_NAME};
