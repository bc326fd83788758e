//! Shared utilities

pub mod config;
pub mod context;
pub mod diagnostic;
pub mod fs;
pub mod process;

pub use config::ShipyardConfig;
pub use context::{GlobalContext, ProjectNotFound};
pub use diagnostic::Diagnostic;
