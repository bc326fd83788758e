//! Test utilities for Shipyard unit tests.
//!
//! Provides fixture builders that lay out Node-style projects on disk:
//! a root `package.json`, installed packages under `node_modules`, license
//! files and a `Shipyard.toml`.
//!
//! # Example
//!
//! ```rust,ignore
//! use shipyard::test_support::NodeProjectBuilder;
//!
//! let project = NodeProjectBuilder::new("app", "1.0.0")
//!     .dependency("left-pad", "^1.3.0")
//!     .package("left-pad", "1.3.0", "WTFPL", &[])
//!     .build();
//! ```

pub mod fixtures;

pub use fixtures::*;
