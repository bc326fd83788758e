//! Command implementations

pub mod build;
pub mod licenses;
pub mod prune;

use anyhow::{Context, Result};

use crate::cli::GlobalArgs;
use shipyard::util::GlobalContext;
use shipyard::Project;

/// Locate `Shipyard.toml` and load the project it belongs to.
pub fn load_project(global: &GlobalArgs) -> Result<(Project, GlobalContext)> {
    let mut ctx = match &global.project {
        Some(dir) => {
            let dir = dir
                .canonicalize()
                .with_context(|| format!("project directory not found: {}", dir.display()))?;
            GlobalContext::with_cwd(dir)?
        }
        None => GlobalContext::new()?,
    };
    ctx.set_color(global.color);

    let config_path = ctx.find_project_config()?;
    tracing::debug!("Using {}", config_path.display());

    let project = Project::load(&config_path, &ctx)?;
    Ok((project, ctx))
}
