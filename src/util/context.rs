//! Global context for Shipyard operations.
//!
//! Provides centralized access to the working directory, global paths and
//! output preferences.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use crate::util::config::{global_config_path, CONFIG_NAME};

/// Error locating the project configuration.
#[derive(Debug, Error)]
pub enum ProjectNotFound {
    #[error("could not find Shipyard.toml in {} or any parent directory", dir.display())]
    Missing { dir: PathBuf },
}

/// Global context containing configuration paths and output settings.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Global configuration file, if the platform has a config directory
    global_config: Option<PathBuf>,

    /// Whether to use colors in output
    color: bool,
}

impl GlobalContext {
    /// Create a new GlobalContext with defaults.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;

        Ok(GlobalContext {
            cwd,
            global_config: global_config_path(),
            color: true,
        })
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Result<Self> {
        let mut ctx = Self::new()?;
        ctx.cwd = cwd;
        Ok(ctx)
    }

    /// Use a specific global config file (or none).
    pub fn with_global_config(mut self, path: Option<PathBuf>) -> Self {
        self.global_config = path;
        self
    }

    /// Set color output.
    pub fn set_color(&mut self, color: bool) {
        self.color = color;
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Get the global configuration file path.
    pub fn global_config_path(&self) -> Option<&Path> {
        self.global_config.as_deref()
    }

    /// Check if color output is enabled.
    pub fn color(&self) -> bool {
        self.color
    }

    /// Find `Shipyard.toml` starting from cwd and searching upward.
    pub fn find_project_config(&self) -> Result<PathBuf, ProjectNotFound> {
        let mut current = self.cwd.clone();
        loop {
            let candidate = current.join(CONFIG_NAME);
            if candidate.is_file() {
                return Ok(candidate);
            }
            if !current.pop() {
                return Err(ProjectNotFound::Missing {
                    dir: self.cwd.clone(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_context_paths() {
        let ctx = GlobalContext::new().unwrap();
        assert!(ctx.cwd().is_absolute());
    }

    #[test]
    fn test_find_project_config() {
        let tmp = TempDir::new().unwrap();
        let config = tmp.path().join(CONFIG_NAME);
        std::fs::write(&config, "").unwrap();

        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf()).unwrap();
        assert_eq!(ctx.find_project_config().ok(), Some(config));
    }

    #[test]
    fn test_find_project_config_from_subdirectory() {
        let tmp = TempDir::new().unwrap();
        let config = tmp.path().join(CONFIG_NAME);
        std::fs::write(&config, "").unwrap();
        let nested = tmp.path().join("src/main");
        std::fs::create_dir_all(&nested).unwrap();

        let ctx = GlobalContext::with_cwd(nested).unwrap();
        assert_eq!(ctx.find_project_config().ok(), Some(config));
    }

    #[test]
    fn test_find_project_config_missing() {
        let tmp = TempDir::new().unwrap();
        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf()).unwrap();

        let err = ctx.find_project_config().unwrap_err();
        assert!(err.to_string().contains(CONFIG_NAME));
    }
}
